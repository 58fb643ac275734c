//! Wire protocols spoken with the ledger node.
//!
//! - REST client for identity, submission and snapshots
//! - Socket.IO push channel over WebSocket
//! - Local node discovery

/// Local node discovery.
pub mod discovery;
/// Error types.
pub mod error;
/// Typed push events.
pub mod events;
/// REST client.
pub mod http;
/// Socket.IO client over WebSocket.
pub mod socketio;

pub use discovery::{DISCOVERY_PORTS, DiscoveredNode, discover_local_node};
pub use error::{ChannelError, NodeError};
pub use events::{EventStream, NodeEvent};
pub use http::{DEFAULT_NODE_URL, MineOutcome, NodeClient, NodeClientConfig};
pub use socketio::{SocketIoConfig, SocketIoStream};

use async_trait::async_trait;
use nodeview_domain::entities::Identity;
use nodeview_domain::value_objects::SendRequest;

/// The part of the node's REST surface the synchronizer and submit path need.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Reads the node's identity.
    async fn identity(&self) -> Result<Identity, NodeError>;

    /// Asks the node to encrypt, sign and broadcast a message.
    async fn send(&self, request: &SendRequest) -> Result<(), NodeError>;
}
