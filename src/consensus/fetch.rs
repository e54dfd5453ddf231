use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::blockchain::Block;
use crate::error::{LedgerError, Result};

/// Source of a peer's full chain.
#[async_trait]
pub trait PeerFetcher: Send + Sync {
    async fn fetch_chain(&self, node: &str) -> Result<Vec<Block>>;
}

/// Body of a peer's `GET /chain`.
#[derive(Deserialize)]
struct PeerChain {
    chain: Vec<Block>,
    length: usize,
}

/// Fetches `http://{node}/chain`, bounded by a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpPeerFetcher {
    client: reqwest::Client,
}

impl HttpPeerFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| LedgerError::PeerTransport {
                node: String::new(),
                source,
            })?;
        Ok(Self { client })
    }

    fn chain_url(node: &str) -> String {
        format!("http://{}/chain", node)
    }
}

#[async_trait]
impl PeerFetcher for HttpPeerFetcher {
    async fn fetch_chain(&self, node: &str) -> Result<Vec<Block>> {
        let transport = |source: reqwest::Error| LedgerError::PeerTransport {
            node: node.to_string(),
            source,
        };

        let resp = self
            .client
            .get(Self::chain_url(node))
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LedgerError::PeerStatus {
                node: node.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(transport)?;
        decode_chain(node, &body)
    }
}

/// Parse a `/chain` body; a `length` that disagrees with the blocks sent
/// makes the whole response malformed.
fn decode_chain(node: &str, body: &[u8]) -> Result<Vec<Block>> {
    let malformed = |reason: String| LedgerError::PeerMalformed {
        node: node.to_string(),
        reason,
    };

    let body: PeerChain = serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))?;
    if body.length != body.chain.len() {
        return Err(malformed(format!(
            "reported length {} but sent {} blocks",
            body.length,
            body.chain.len()
        )));
    }

    Ok(body.chain)
}
