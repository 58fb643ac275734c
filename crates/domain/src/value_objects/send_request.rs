use serde::{Deserialize, Serialize};

/// Body of `POST /send`. The node encrypts `message` for `to_pub`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub to_node: String,
    pub to_pub: String,
    pub message: String,
}
