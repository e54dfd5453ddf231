use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("proof {proof} does not solve the puzzle for last proof {last_proof}")]
    InvalidProof { last_proof: u64, proof: u64 },

    #[error("mining cancelled before a proof was found")]
    MiningCancelled,

    #[error("invalid node address: {0:?}")]
    InvalidNodeAddress(String),

    #[error("peer {node} request failed: {source}")]
    PeerTransport {
        node: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("peer {node} answered with status {status}")]
    PeerStatus { node: String, status: u16 },

    #[error("peer {node} sent a malformed chain: {reason}")]
    PeerMalformed { node: String, reason: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
