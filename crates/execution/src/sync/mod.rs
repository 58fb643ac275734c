//! State synchronization with the node.
//!
//! Provides live mirroring via:
//! - Push channel listening with reconnection
//! - Reconciliation rules over the mirrored state
//! - A synchronizer owning the channel lifecycle

mod listener;
mod state;
mod synchronizer;

pub use listener::*;
pub use state::*;
pub use synchronizer::*;
