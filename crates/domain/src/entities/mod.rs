pub mod block;
pub mod identity;
pub mod peer;
pub mod transaction;

// Re-export for easier access
pub use block::Block;
pub use identity::Identity;
pub use peer::Peer;
pub use transaction::Transaction;
