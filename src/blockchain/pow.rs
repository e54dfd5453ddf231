use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};

/// Shared stop signal for a running `solve_cancellable`.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Puzzle binding consecutive blocks: find `proof` such that
/// sha256("{last_proof}{proof}") starts with `difficulty` zero hex digits.
#[derive(Debug, Clone, Copy)]
pub struct ProofOfWork {
    difficulty: u32,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Smallest non-negative proof accepted after `last_proof`.
    /// Runs until found; there is no way to stop it.
    pub fn solve(&self, last_proof: u64) -> u64 {
        let mut proof = 0u64;
        while !self.is_valid(last_proof, proof) {
            proof += 1;
        }
        proof
    }

    /// Same search as `solve`, checking `cancel` before every attempt.
    pub fn solve_cancellable(&self, last_proof: u64, cancel: &CancelFlag) -> Result<u64> {
        let mut proof = 0u64;
        loop {
            if cancel.is_cancelled() {
                return Err(LedgerError::MiningCancelled);
            }
            if self.is_valid(last_proof, proof) {
                return Ok(proof);
            }
            proof += 1;
        }
    }

    pub fn is_valid(&self, last_proof: u64, proof: u64) -> bool {
        let guess = format!("{last_proof}{proof}");
        let digest = hex::encode(Sha256::digest(guess.as_bytes()));
        digest.starts_with(&"0".repeat(self.difficulty as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelFlag, ProofOfWork};
    use crate::error::LedgerError;
    use proptest::prelude::*;

    #[test]
    fn reference_difficulty_solves_genesis_proof() {
        let pow = ProofOfWork::new(4);
        let proof = pow.solve(100);
        assert!(pow.is_valid(100, proof));
        // smallest: nothing below it passes
        assert!((0..proof).all(|p| !pow.is_valid(100, p)));
    }

    #[test]
    fn solve_is_deterministic() {
        let pow = ProofOfWork::new(2);
        assert_eq!(pow.solve(7), pow.solve(7));
    }

    #[test]
    fn zero_difficulty_accepts_anything() {
        let pow = ProofOfWork::new(0);
        assert!(pow.is_valid(1, 1));
        assert_eq!(pow.solve(12345), 0);
    }

    #[test]
    fn cancelled_search_stops() {
        let pow = ProofOfWork::new(64);
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(matches!(
            pow.solve_cancellable(1, &cancel),
            Err(LedgerError::MiningCancelled)
        ));
    }

    #[test]
    fn cancellable_matches_plain_solve() {
        let pow = ProofOfWork::new(2);
        let cancel = CancelFlag::new();
        assert_eq!(pow.solve_cancellable(42, &cancel).unwrap(), pow.solve(42));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn solved_proof_is_valid(last in any::<u64>()) {
            let pow = ProofOfWork::new(2);
            prop_assert!(pow.is_valid(last, pow.solve(last)));
        }
    }
}
