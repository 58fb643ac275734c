use serde::{Deserialize, Serialize};

/// A chat message carried as a ledger transaction.
///
/// `message` is ciphertext produced by the node for the recipient's key and is
/// never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_pub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Transaction {
    pub fn new(from: impl Into<String>, to: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            message: message.into(),
            sender_pub: None,
            signature: None,
        }
    }

    pub fn is_addressed_to(&self, address: &str) -> bool {
        self.to == address
    }

    /// Ciphertext cut to `max_chars` characters, with an ellipsis when cut.
    pub fn message_preview(&self, max_chars: usize) -> String {
        let mut chars = self.message.chars();
        let preview: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{preview}...")
        } else {
            preview
        }
    }
}
