use log::debug;

use super::{Block, ProofOfWork};
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

/// In-memory chain plus the pool of transactions waiting for the next block.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    pow: ProofOfWork,
}

impl Ledger {
    /// Start a ledger holding only the genesis block.
    pub fn new(genesis_proof: u64, genesis_previous_hash: &str, pow: ProofOfWork) -> Self {
        let genesis = Block::new(1, Vec::new(), genesis_proof, genesis_previous_hash.to_string());
        Self {
            chain: vec![genesis],
            pending: Vec::new(),
            pow,
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds the genesis block")
    }

    /// Queue a transaction; returns the index of the block that will hold it.
    pub fn new_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: i64,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, recipient, amount));
        self.last_block().index + 1
    }

    /// Seal the pending pool into a new block.
    ///
    /// `proof` must solve the puzzle against the current last block's proof,
    /// otherwise nothing changes. Without `previous_hash` the digest of the
    /// current last block is used.
    pub fn seal_block(&mut self, proof: u64, previous_hash: Option<String>) -> Result<&Block> {
        let last = self.last_block();
        if !self.pow.is_valid(last.proof, proof) {
            return Err(LedgerError::InvalidProof {
                last_proof: last.proof,
                proof,
            });
        }

        let index = last.index + 1;
        let previous_hash = previous_hash.unwrap_or_else(|| last.digest());
        let transactions = std::mem::take(&mut self.pending);
        debug!(
            "sealing block #{} with {} txs (proof={})",
            index,
            transactions.len(),
            proof
        );

        self.chain
            .push(Block::new(index, transactions, proof, previous_hash));
        Ok(self.last_block())
    }

    /// Seal with `reward` appended to the pool, only once `proof` is known to
    /// be accepted; a rejected proof leaves the pool exactly as it was.
    pub fn seal_block_with_reward(
        &mut self,
        proof: u64,
        previous_hash: Option<String>,
        reward: Transaction,
    ) -> Result<&Block> {
        let last_proof = self.last_block().proof;
        if !self.pow.is_valid(last_proof, proof) {
            return Err(LedgerError::InvalidProof { last_proof, proof });
        }
        self.pending.push(reward);
        self.seal_block(proof, previous_hash)
    }

    /// Swap in a whole chain adopted by conflict resolution.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        if chain.is_empty() {
            return;
        }
        self.chain = chain;
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn pow(&self) -> ProofOfWork {
        self.pow
    }
}

#[cfg(test)]
mod tests {
    use super::Ledger;
    use crate::blockchain::ProofOfWork;
    use crate::error::LedgerError;
    use crate::transaction::Transaction;

    fn ledger() -> Ledger {
        Ledger::new(100, "1", ProofOfWork::new(2))
    }

    fn mine(l: &mut Ledger) -> u64 {
        let proof = l.pow().solve(l.last_block().proof);
        l.seal_block(proof, None).unwrap().index
    }

    #[test]
    fn genesis_block() {
        let l = ledger();
        assert_eq!(l.len(), 1);
        let g = l.last_block();
        assert_eq!(g.index, 1);
        assert_eq!(g.proof, 100);
        assert_eq!(g.previous_hash, "1");
        assert!(g.transactions.is_empty());
    }

    #[test]
    fn new_transaction_targets_next_block() {
        let mut l = ledger();
        assert_eq!(l.new_transaction("a", "b", 5), 2);
        assert_eq!(l.new_transaction("b", "c", 1), 2);
        assert_eq!(l.pending().len(), 2);
    }

    #[test]
    fn sealing_drains_pool_in_order() {
        let mut l = ledger();
        l.new_transaction("a", "b", 5);
        l.new_transaction("b", "c", 1);
        let genesis_digest = l.last_block().digest();

        mine(&mut l);

        let b = l.last_block();
        assert_eq!(b.index, 2);
        assert_eq!(b.previous_hash, genesis_digest);
        assert_eq!(b.transactions.len(), 2);
        assert_eq!(b.transactions[0].sender, "a");
        assert_eq!(b.transactions[1].sender, "b");
        assert!(l.pending().is_empty());
        assert_eq!(l.new_transaction("x", "y", 1), 3);
    }

    #[test]
    fn each_seal_grows_chain_by_one() {
        let mut l = ledger();
        for expected in 2..6 {
            let before = l.len();
            assert_eq!(mine(&mut l), expected);
            assert_eq!(l.len(), before + 1);
        }
    }

    #[test]
    fn explicit_previous_hash_is_kept() {
        let mut l = ledger();
        let proof = l.pow().solve(100);
        let b = l.seal_block(proof, Some("custom".into())).unwrap();
        assert_eq!(b.previous_hash, "custom");
    }

    #[test]
    fn bad_proof_is_rejected_without_side_effects() {
        let mut l = ledger();
        l.new_transaction("a", "b", 1);
        let pow = l.pow();
        let bad = (0..).find(|p| !pow.is_valid(100, *p)).unwrap();

        let err = l.seal_block(bad, None).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidProof { last_proof: 100, .. }));
        assert_eq!(l.len(), 1);
        assert_eq!(l.pending().len(), 1);
    }

    #[test]
    fn reward_goes_last_in_sealed_block() {
        let mut l = ledger();
        l.new_transaction("a", "b", 5);
        let proof = l.pow().solve(100);
        let b = l
            .seal_block_with_reward(proof, None, Transaction::new("0", "miner", 1))
            .unwrap();
        assert_eq!(b.transactions.len(), 2);
        assert_eq!(b.transactions[1], Transaction::new("0", "miner", 1));
        assert!(l.pending().is_empty());
    }

    #[test]
    fn rejected_reward_seal_leaves_pool_untouched() {
        let mut l = ledger();
        l.new_transaction("a", "b", 5);
        let pow = l.pow();
        let bad = (0..).find(|p| !pow.is_valid(100, *p)).unwrap();

        let err = l
            .seal_block_with_reward(bad, None, Transaction::new("0", "miner", 1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidProof { .. }));
        assert_eq!(l.pending(), &[Transaction::new("a", "b", 5)]);
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn replace_chain_swaps_everything() {
        let mut l = ledger();
        let mut other = ledger();
        mine(&mut other);
        mine(&mut other);
        l.replace_chain(other.chain().to_vec());
        assert_eq!(l.len(), 3);
        assert_eq!(l.last_block().index, 3);
    }
}
