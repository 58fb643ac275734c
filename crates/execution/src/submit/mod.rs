//! Message submission.
//!
//! Sends one request per submit; the resulting transaction comes back
//! through the push channel, not through the response.

mod action;

pub use action::*;
