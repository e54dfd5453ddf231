use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{AppState, RegisterNodesRequest, RegisterNodesResponse, ResolveResponse};
use crate::consensus::normalize_address;

/// Register peer nodes given as URLs or `host:port`.
#[post("/nodes/register")]
pub async fn register_nodes(
    state: web::Data<AppState>,
    body: web::Json<RegisterNodesRequest>,
) -> impl Responder {
    let nodes = match body.into_inner().nodes {
        Some(nodes) if !nodes.is_empty() => nodes,
        _ => {
            warn!("POST /nodes/register - rejected: no nodes supplied");
            return HttpResponse::BadRequest().body("Error: Please supply a valid list of nodes");
        }
    };

    // All-or-nothing: one bad address rejects the whole request.
    if let Some(e) = nodes.iter().find_map(|a| normalize_address(a).err()) {
        warn!("POST /nodes/register - rejected: {e}");
        return HttpResponse::BadRequest().body(e.to_string());
    }

    let mut registry = state.nodes.lock().expect("mutex poisoned");
    for address in &nodes {
        if let Err(e) = registry.register_node(address) {
            return HttpResponse::BadRequest().body(e.to_string());
        }
    }
    info!("POST /nodes/register - {} known peers", registry.len());

    HttpResponse::Created().json(RegisterNodesResponse {
        message: "New nodes have been added",
        total_nodes: registry.iter().cloned().collect(),
    })
}

/// Fetch every peer's chain and adopt the longest valid one.
#[get("/nodes/resolve")]
pub async fn resolve_conflicts(state: web::Data<AppState>) -> impl Responder {
    let peers: Vec<String> = {
        let registry = state.nodes.lock().expect("mutex poisoned");
        registry.iter().cloned().collect()
    };

    // Sequential, in registry order; each fetch is bounded by the client timeout.
    let mut fetched = Vec::with_capacity(peers.len());
    for node in peers {
        let result = state.fetcher.fetch_chain(&node).await;
        fetched.push((node, result));
    }

    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    let replaced = state.resolver.resolve_ledger(&mut ledger, fetched);
    if replaced {
        info!("RESOLVE - chain replaced, new length {}", ledger.len());
    }

    HttpResponse::Ok().json(ResolveResponse {
        message: if replaced {
            "Our chain was replaced"
        } else {
            "Our chain is authoritative"
        },
        replaced,
        chain: ledger.chain(),
    })
}
