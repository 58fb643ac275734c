//! Events pushed by the node.

use crate::error::ChannelError;
use async_trait::async_trait;
use nodeview_domain::entities::{Block, Peer, Transaction};
use serde_json::Value;

/// Event name for peer list snapshots.
pub const PEERS_EVENT: &str = "peers";
/// Event name for chain snapshots.
pub const CHAIN_EVENT: &str = "chain";
/// Event name for newly seen transactions.
pub const NEW_TX_EVENT: &str = "new_tx";
/// Event name for newly accepted blocks.
pub const NEW_BLOCK_EVENT: &str = "new_block";

/// A typed push event.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// Full peer list.
    Peers(Vec<Peer>),
    /// Full chain snapshot, in the order the node sent it.
    Chain(Vec<Block>),
    /// A transaction entered the node's pending pool.
    NewTx(Transaction),
    /// A block was accepted.
    NewBlock(Block),
}

impl NodeEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Peers(_) => PEERS_EVENT,
            Self::Chain(_) => CHAIN_EVENT,
            Self::NewTx(_) => NEW_TX_EVENT,
            Self::NewBlock(_) => NEW_BLOCK_EVENT,
        }
    }

    /// Decodes the payload of a named event.
    ///
    /// Returns `Ok(None)` for event names this client does not handle.
    ///
    /// # Errors
    /// Returns an error if the payload does not match the event's shape.
    pub fn decode(name: &str, payload: Value) -> Result<Option<Self>, serde_json::Error> {
        let event = match name {
            PEERS_EVENT => Self::Peers(serde_json::from_value(payload)?),
            CHAIN_EVENT => Self::Chain(serde_json::from_value(payload)?),
            NEW_TX_EVENT => Self::NewTx(serde_json::from_value(payload)?),
            NEW_BLOCK_EVENT => Self::NewBlock(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

/// A connection that yields node events.
///
/// `connect` may be called again after the stream ended; implementations
/// start a fresh session each time.
#[async_trait]
pub trait EventStream: Send {
    /// Opens the connection and completes any handshake.
    async fn connect(&mut self) -> Result<(), ChannelError>;

    /// Waits for the next event. `Ok(None)` means the node closed the session.
    async fn next_event(&mut self) -> Result<Option<NodeEvent>, ChannelError>;

    /// Closes the connection. Closing an unconnected stream is a no-op.
    async fn close(&mut self) -> Result<(), ChannelError>;
}
