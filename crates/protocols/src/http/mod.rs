//! REST client for the ledger node.
//!
//! Covers the node's HTTP surface:
//! - Identity (`GET /id`)
//! - Message submission (`POST /send`)
//! - Peer, chain and pending snapshots
//! - Manual mining (`POST /mine`)

mod client;

pub use client::*;
