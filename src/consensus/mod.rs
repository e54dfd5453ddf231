//! Fork choice: adopt the longest peer chain that passes full validation.

pub mod fetch;
pub mod node;

use log::{debug, info, warn};

use crate::blockchain::{Block, Ledger, ProofOfWork};
use crate::error::Result;

pub use fetch::{HttpPeerFetcher, PeerFetcher};
pub use node::{NodeRegistry, normalize_address};

/// Outcome of one conflict-resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No peer offered a longer valid chain; the local one stays.
    Authoritative,
    /// This peer chain is longer and valid and should replace the local one.
    Replaced(Vec<Block>),
}

impl Resolution {
    pub fn replaced(&self) -> bool {
        matches!(self, Resolution::Replaced(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConsensusResolver {
    pow: ProofOfWork,
}

impl ConsensusResolver {
    pub fn new(pow: ProofOfWork) -> Self {
        Self { pow }
    }

    /// Walk the chain checking index sequence, hash links and proofs
    /// between every adjacent pair. Transaction contents are not inspected.
    ///
    /// Indices come from peers, so they are compared without arithmetic
    /// that could overflow; the chain must start at index 1.
    pub fn validate_chain(&self, chain: &[Block]) -> bool {
        match chain.first() {
            Some(genesis) if genesis.index == 1 => {}
            Some(genesis) => {
                debug!("chain invalid: starts at #{}", genesis.index);
                return false;
            }
            None => return false,
        }

        for pair in chain.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);

            if prev.index.checked_add(1) != Some(cur.index) {
                debug!("chain invalid at #{}: index does not follow #{}", cur.index, prev.index);
                return false;
            }
            if cur.previous_hash != prev.digest() {
                debug!("chain invalid at #{}: previous_hash mismatch", cur.index);
                return false;
            }
            if !self.pow.is_valid(prev.proof, cur.proof) {
                debug!("chain invalid at #{}: bad proof {}", cur.index, cur.proof);
                return false;
            }
        }

        true
    }

    /// Pick the longest valid chain among `peers`, strictly longer than `local`.
    ///
    /// Peers are considered in iteration order and a candidate must beat the
    /// current best by length, so on a tie the earlier peer keeps its place.
    /// Failed fetches are skipped.
    pub fn resolve<I>(&self, local: &[Block], peers: I) -> Resolution
    where
        I: IntoIterator<Item = (String, Result<Vec<Block>>)>,
    {
        let mut max_length = local.len();
        let mut best: Option<(String, Vec<Block>)> = None;

        for (node, fetched) in peers {
            let chain = match fetched {
                Ok(chain) => chain,
                Err(e) => {
                    warn!("skipping peer {node}: {e}");
                    continue;
                }
            };

            if chain.len() <= max_length {
                debug!("peer {node} chain length {} not longer than {max_length}", chain.len());
                continue;
            }
            if !self.validate_chain(&chain) {
                warn!("peer {node} offered an invalid chain of length {}", chain.len());
                continue;
            }

            max_length = chain.len();
            best = Some((node, chain));
        }

        match best {
            Some((node, chain)) => {
                info!("adopting chain of length {} from {node}", chain.len());
                Resolution::Replaced(chain)
            }
            None => Resolution::Authoritative,
        }
    }

    /// Resolve against `ledger`'s chain and swap it in place if a peer wins.
    /// Returns whether the chain was replaced.
    pub fn resolve_ledger<I>(&self, ledger: &mut Ledger, peers: I) -> bool
    where
        I: IntoIterator<Item = (String, Result<Vec<Block>>)>,
    {
        match self.resolve(ledger.chain(), peers) {
            Resolution::Replaced(chain) => {
                ledger.replace_chain(chain);
                true
            }
            Resolution::Authoritative => false,
        }
    }
}
