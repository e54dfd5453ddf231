pub mod block;
pub mod model;
pub mod pow;

pub use block::Block;
pub use model::Ledger;
pub use pow::{CancelFlag, ProofOfWork};

/// Default Proof-of-Work difficulty (number of leading zero hex digits).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Seed proof of the genesis block.
pub const DEFAULT_GENESIS_PROOF: u64 = 100;

/// Sentinel `previous_hash` of the genesis block (not a real digest).
pub const DEFAULT_GENESIS_PREVIOUS_HASH: &str = "1";

/// Amount credited to the miner for each sealed block.
pub const DEFAULT_MINING_REWARD: i64 = 1;

/// Sender recorded on mining rewards.
pub const REWARD_SENDER: &str = "0";
