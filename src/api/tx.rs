use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::models::{AppState, MessageResponse, NewTxRequest};

/// Queue a transaction for the next mined block.
#[post("/transactions/new")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let NewTxRequest {
        sender,
        recipient,
        amount,
    } = body.into_inner();

    let (Some(sender), Some(recipient), Some(amount)) = (sender, recipient, amount) else {
        warn!("POST /transactions/new - rejected: missing field");
        return HttpResponse::BadRequest().body("Missing values");
    };

    let index = {
        let mut ledger = state.ledger.lock().expect("mutex poisoned");
        let index = ledger.new_transaction(sender, recipient, amount);
        debug!(
            "POST /transactions/new - queued for block #{} (pending={})",
            index,
            ledger.pending().len()
        );
        index
    };

    HttpResponse::Created().json(MessageResponse {
        message: format!("Transaction will be added to Block {index}"),
    })
}

/// List transactions waiting for the next block.
#[get("/transactions/pending")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ledger.pending())
}
