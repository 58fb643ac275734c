use super::Transaction;
use serde::{Deserialize, Serialize};

/// A block as reported by the node. Linkage is never checked client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub prev_hash: String,
    pub hash: String,
    // Some node builds serialize the list under the singular key.
    #[serde(default, alias = "transaction")]
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
}

impl Block {
    pub fn new(
        index: u64,
        prev_hash: impl Into<String>,
        hash: impl Into<String>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            index,
            prev_hash: prev_hash.into(),
            hash: hash.into(),
            transactions,
            timestamp: None,
            nonce: None,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_accepts_singular_transaction_key() {
        let json = r#"{
            "index": 1,
            "timestamp": 1700000000.5,
            "transaction": [{"from": "A", "to": "B", "message": "x1"}],
            "prev_hash": "000abc",
            "nonce": 4711,
            "hash": "000def"
        }"#;

        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.index, 1);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].message, "x1");
        assert_eq!(block.nonce, Some(4711));
    }

    #[test]
    fn test_block_without_transactions() {
        let json = r#"{"index": 0, "prev_hash": "0", "hash": "abc"}"#;

        let block: Block = serde_json::from_str(json).unwrap();
        assert!(block.is_genesis());
        assert!(block.transactions.is_empty());
        assert!(block.timestamp.is_none());
    }
}
