//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use nodeview_execution::prelude::*;
//! ```

// Errors
pub use crate::error::{SubmitActionError, SyncError};

// Submit
pub use crate::submit::{SubmitAction, SubmitReceipt};

// Sync
pub use crate::sync::{
    ChannelListener, ChannelListenerConfig, ChannelUpdate, ClientStateSynchronizer, InboxEntry,
    SyncState,
};
