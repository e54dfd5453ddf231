use actix_web::{HttpResponse, Responder, get, web};
use log::{debug, info, warn};
use tokio::time::Instant;

use super::models::{AppState, ChainResponse, MessageResponse, MineResponse, ValidateResponse};
use crate::blockchain::{CancelFlag, REWARD_SENDER};
use crate::transaction::Transaction;

/// Get the full blockchain.
#[get("/chain")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        chain: ledger.chain(),
        length: ledger.len(),
    })
}

/// Validate the local chain.
#[get("/chain/validate")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ValidateResponse {
        valid: state.resolver.validate_chain(ledger.chain()),
        length: ledger.len(),
    })
}

/// Mine the next block:
/// - Solve the puzzle against the current head's proof (off the request thread)
/// - Credit the mining reward to this node
/// - Seal the pending pool into a new block
///
/// If the head changed while solving (a block was sealed or the chain was
/// replaced), solve again against the new head. `MINE_TIMEOUT_SECS` bounds
/// the whole request, retries included.
#[get("/mine")]
pub async fn mine_block(state: web::Data<AppState>) -> HttpResponse {
    let deadline = state.config.mine_timeout.map(|limit| Instant::now() + limit);

    loop {
        let (last_proof, last_digest) = {
            let ledger = state.ledger.lock().expect("mutex poisoned");
            let last = ledger.last_block();
            (last.proof, last.digest())
        };

        let proof = match solve_puzzle(&state, last_proof, deadline).await {
            Ok(proof) => proof,
            Err(resp) => return resp,
        };

        let mut ledger = state.ledger.lock().expect("mutex poisoned");
        let last = ledger.last_block();
        if last.proof != last_proof || last.digest() != last_digest {
            info!("MINER - head moved to #{} while solving, retrying", last.index);
            continue;
        }

        let reward = Transaction::new(
            REWARD_SENDER,
            state.node_id.as_str(),
            state.config.mining_reward,
        );
        let block = match ledger.seal_block_with_reward(proof, Some(last_digest), reward) {
            Ok(block) => block,
            Err(e) => {
                warn!("MINER - seal rejected: {e}");
                return HttpResponse::InternalServerError().json(MessageResponse {
                    message: e.to_string(),
                });
            }
        };

        info!(
            "MINER - sealed block #{} (proof={}, txs={})",
            block.index,
            block.proof,
            block.transactions.len()
        );
        return HttpResponse::Ok().json(MineResponse {
            message: "New Block Forged",
            index: block.index,
            transactions: block.transactions.clone(),
            proof: block.proof,
            previous_hash: block.previous_hash.clone(),
        });
    }
}

/* -------------------- Helpers -------------------- */

/// Trips the flag when the request future is dropped, so an abandoned
/// request does not leave a worker spinning.
struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

fn timed_out() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(MessageResponse {
        message: "mining timed out".to_string(),
    })
}

/// Run the puzzle on the blocking pool, stopping at `deadline` if one is set.
async fn solve_puzzle(
    state: &AppState,
    last_proof: u64,
    deadline: Option<Instant>,
) -> Result<u64, HttpResponse> {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        warn!("MINER - deadline passed before solving after proof {last_proof}");
        return Err(timed_out());
    }

    let pow = state.pow;
    let cancel = CancelFlag::new();
    let worker_cancel = cancel.clone();
    // dropped on every exit path, including timeout and client disconnect
    let _guard = CancelOnDrop(cancel);

    debug!("MINER - solving after proof {} (difficulty={})", last_proof, pow.difficulty());
    let job = web::block(move || pow.solve_cancellable(last_proof, &worker_cancel));

    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, job).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!("MINER - gave up solving after proof {last_proof}: deadline passed");
                return Err(timed_out());
            }
        },
        None => job.await,
    };

    match joined {
        Ok(Ok(proof)) => Ok(proof),
        Ok(Err(e)) => Err(HttpResponse::ServiceUnavailable().json(MessageResponse {
            message: e.to_string(),
        })),
        Err(e) => {
            warn!("MINER - worker failed: {e}");
            Err(HttpResponse::InternalServerError().json(MessageResponse {
                message: "mining worker failed".to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use tokio::time::Instant;

    use super::solve_puzzle;
    use crate::api::AppState;
    use crate::config::Config;
    use crate::consensus::HttpPeerFetcher;

    fn state(difficulty: u32) -> AppState {
        let config = Config {
            difficulty,
            ..Config::default()
        };
        let fetcher = HttpPeerFetcher::new(Duration::from_secs(1)).unwrap();
        AppState::new(config, "node-test".to_string(), Box::new(fetcher))
    }

    #[actix_web::test]
    async fn spent_deadline_refuses_another_attempt() {
        let state = state(0);
        let spent = Instant::now() - Duration::from_millis(1);
        let resp = solve_puzzle(&state, 100, Some(spent)).await.unwrap_err();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn open_deadline_solves() {
        let state = state(2);
        let later = Instant::now() + Duration::from_secs(30);
        let proof = solve_puzzle(&state, 100, Some(later)).await.unwrap();
        assert!(state.pow.is_valid(100, proof));
    }
}
