use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::transaction::Transaction;

/// A sealed block: a batch of transactions anchored behind a proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64, // seconds since the Unix epoch
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp: now_secs(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// SHA-256 over the canonical JSON form of the block.
    pub fn digest(&self) -> String {
        let value = serde_json::to_value(self).expect("serialize block");
        digest_json(&value)
    }
}

/// Hash any JSON value with its object keys sorted, so field order
/// in memory or on the wire never changes the result.
pub fn digest_json(value: &Value) -> String {
    let canonical = serde_json::to_vec(&sorted(value)).expect("serialize canonical json");
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hex::encode(hasher.finalize())
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sorted(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::{Block, digest_json};
    use crate::transaction::Transaction;

    fn sample() -> Block {
        Block {
            index: 2,
            timestamp: 1_700_000_000.25,
            transactions: vec![Transaction::new("0", "node-a", 1)],
            proof: 35293,
            previous_hash: "abc".into(),
        }
    }

    #[test]
    fn digest_is_lowercase_sha256_hex() {
        let d = sample().digest();
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn digest_ignores_field_order() {
        let a = r#"{"index":2,"timestamp":1700000000.25,"transactions":[{"sender":"0","recipient":"node-a","amount":1}],"proof":35293,"previous_hash":"abc"}"#;
        let b = r#"{"previous_hash":"abc","proof":35293,"transactions":[{"amount":1,"recipient":"node-a","sender":"0"}],"timestamp":1700000000.25,"index":2}"#;

        let va: serde_json::Value = serde_json::from_str(a).unwrap();
        let vb: serde_json::Value = serde_json::from_str(b).unwrap();
        assert_eq!(digest_json(&va), digest_json(&vb));

        let ba: Block = serde_json::from_str(a).unwrap();
        let bb: Block = serde_json::from_str(b).unwrap();
        assert_eq!(ba.digest(), bb.digest());
        assert_eq!(ba.digest(), sample().digest());
    }

    #[test]
    fn digest_changes_with_every_field() {
        let base = sample();
        let base_digest = base.digest();

        let mut variants = Vec::new();
        let mut b = base.clone();
        b.index += 1;
        variants.push(b);
        let mut b = base.clone();
        b.timestamp += 0.5;
        variants.push(b);
        let mut b = base.clone();
        b.transactions.push(Transaction::new("x", "y", 3));
        variants.push(b);
        let mut b = base.clone();
        b.transactions[0].amount = 2;
        variants.push(b);
        let mut b = base.clone();
        b.proof += 1;
        variants.push(b);
        let mut b = base.clone();
        b.previous_hash.push('d');
        variants.push(b);

        let mut seen = std::collections::HashSet::new();
        seen.insert(base_digest);
        for v in variants {
            assert!(seen.insert(v.digest()), "collision for {v:?}");
        }
    }
}
