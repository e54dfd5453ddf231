use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::blockchain::{Block, Ledger, ProofOfWork};
use crate::config::Config;
use crate::consensus::{ConsensusResolver, NodeRegistry, PeerFetcher};
use crate::transaction::Transaction;

/// Shared application state: the ledger, known peers and the consensus tools.
pub struct AppState {
    pub ledger: Mutex<Ledger>,
    pub nodes: Mutex<NodeRegistry>,
    pub pow: ProofOfWork,
    pub resolver: ConsensusResolver,
    pub fetcher: Box<dyn PeerFetcher>,
    pub node_id: String,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, node_id: String, fetcher: Box<dyn PeerFetcher>) -> Self {
        let pow = ProofOfWork::new(config.difficulty);
        Self {
            ledger: Mutex::new(Ledger::new(
                config.genesis_proof,
                &config.genesis_previous_hash,
                pow,
            )),
            nodes: Mutex::new(NodeRegistry::new()),
            pow,
            resolver: ConsensusResolver::new(pow),
            fetcher,
            node_id,
            config,
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub chain: &'a [Block],
    pub length: usize,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub message: &'static str,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

/* ---------- TX API Models ---------- */

/// Every field optional so a missing one is reported as a rejection
/// rather than a deserialization failure.
#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/* ---------- Node API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct RegisterNodesResponse {
    pub message: &'static str,
    pub total_nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse<'a> {
    pub message: &'static str,
    pub replaced: bool,
    pub chain: &'a [Block],
}
