//! Error taxonomy of the client.

use crate::enums::FormField;
use thiserror::Error;

/// Input rejected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("recipient node address is required")]
    MissingRecipientAddress,
    #[error("recipient public key is required")]
    MissingRecipientKey,
    #[error("message is required")]
    MissingMessage,
}

impl ValidationError {
    /// The form field that caused the rejection.
    pub fn field(&self) -> FormField {
        match self {
            Self::MissingRecipientAddress => FormField::RecipientAddress,
            Self::MissingRecipientKey => FormField::RecipientKey,
            Self::MissingMessage => FormField::Message,
        }
    }
}

/// The node did not accept a send request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("node rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("node did not answer in time")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

/// The identity read at startup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch node identity: {reason}")]
pub struct BootstrapError {
    pub reason: String,
}

impl BootstrapError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
