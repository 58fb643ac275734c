//! Client-side state synchronization with a ledger node.
//!
//! This crate provides:
//! - A synchronizer that mirrors the node's peers, chain and pending pool
//! - The push channel listener with its reconnection policy
//! - The message submit action

/// Prelude module for convenient imports.
pub mod prelude;

/// Error types.
pub mod error;
/// Message submission.
pub mod submit;
/// State synchronization.
pub mod sync;
