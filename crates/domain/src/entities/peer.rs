use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A peer record. The node decides its shape; usually a node URL string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Peer(pub Value);

impl Peer {
    /// Returns the peer address when the node sent a plain string.
    pub fn address(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl From<&str> for Peer {
    fn from(address: &str) -> Self {
        Self(Value::String(address.to_string()))
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(address) => write!(f, "{address}"),
            other => write!(f, "{other}"),
        }
    }
}
