//! Socket.IO v4 client over a plain WebSocket.
//!
//! Only what the node's push channel needs:
//! - Engine.IO handshake and heartbeat
//! - Namespace connect and disconnect
//! - Text events (binary attachments are ignored)

mod packet;
mod stream;

pub use packet::*;
pub use stream::*;
