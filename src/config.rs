use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::{
    DEFAULT_DIFFICULTY, DEFAULT_GENESIS_PREVIOUS_HASH, DEFAULT_GENESIS_PROOF, DEFAULT_MINING_REWARD,
};

/// Node settings, read once from the environment at startup.
///
/// Environment variables:
/// - `HOST`, `PORT`: bind address
/// - `POW_DIFFICULTY`: leading zero hex digits required by the puzzle
/// - `GENESIS_PROOF`, `GENESIS_PREVIOUS_HASH`: genesis seed values
/// - `MINING_REWARD`: amount credited to this node per mined block
/// - `PEER_TIMEOUT_SECS`: deadline for fetching one peer's chain
/// - `MINE_TIMEOUT_SECS`: optional deadline for one mining request
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
    pub genesis_proof: u64,
    pub genesis_previous_hash: String,
    pub mining_reward: i64,
    pub peer_timeout: Duration,
    pub mine_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            difficulty: DEFAULT_DIFFICULTY,
            genesis_proof: DEFAULT_GENESIS_PROOF,
            genesis_previous_hash: DEFAULT_GENESIS_PREVIOUS_HASH.to_string(),
            mining_reward: DEFAULT_MINING_REWARD,
            peer_timeout: Duration::from_secs(5),
            mine_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            difficulty: parse_var("POW_DIFFICULTY").unwrap_or(defaults.difficulty),
            genesis_proof: parse_var("GENESIS_PROOF").unwrap_or(defaults.genesis_proof),
            genesis_previous_hash: env::var("GENESIS_PREVIOUS_HASH")
                .unwrap_or(defaults.genesis_previous_hash),
            mining_reward: parse_var("MINING_REWARD").unwrap_or(defaults.mining_reward),
            peer_timeout: parse_var("PEER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.peer_timeout),
            mine_timeout: parse_var("MINE_TIMEOUT_SECS").map(Duration::from_secs),
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring unparsable {key}={raw:?}, using default");
            None
        }
    }
}
