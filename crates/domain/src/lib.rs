//! Domain model shared by the node client crates.
//!
//! Entities mirror the JSON the ledger node serves, value objects hold the
//! client-side input that is validated before anything leaves the process.

pub mod entities;
pub mod enums;
pub mod error;
pub mod value_objects;
