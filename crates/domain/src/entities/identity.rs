use serde::{Deserialize, Serialize};

/// The node's own public identity, served by `GET /id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Base64-encoded PEM public key.
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Identity {
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            port: None,
        }
    }
}
