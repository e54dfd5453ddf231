use std::collections::BTreeSet;

use log::info;
use url::Url;

use crate::error::{LedgerError, Result};

/// Reduce a peer address to its `host[:port]` authority.
///
/// `http://10.0.0.5:5000/x` and `10.0.0.5:5000` both become `10.0.0.5:5000`.
pub fn normalize_address(address: &str) -> Result<String> {
    let trimmed = address.trim();
    let invalid = || LedgerError::InvalidNodeAddress(address.to_string());

    let authority = if trimmed.contains("://") {
        let url = Url::parse(trimmed).map_err(|_| invalid())?;
        let host = url.host_str().ok_or_else(invalid)?;
        match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    } else {
        trimmed.split('/').next().unwrap_or_default().to_string()
    };

    if authority.is_empty() || authority.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(authority)
}

/// Known peers, kept sorted so resolution visits them in a fixed order.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: BTreeSet<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer; registering the same authority twice is a no-op.
    pub fn register_node(&mut self, address: &str) -> Result<String> {
        let node = normalize_address(address)?;
        if self.nodes.insert(node.clone()) {
            info!("registered peer {node}");
        }
        Ok(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
