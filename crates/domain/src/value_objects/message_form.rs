use super::SendRequest;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// User input for a one-to-one message.
///
/// The recipient fields survive a successful send so several messages can go
/// to the same recipient; only the message text is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageForm {
    pub recipient_address: String,
    pub recipient_key: String,
    pub message: String,
}

impl MessageForm {
    pub fn new(
        recipient_address: impl Into<String>,
        recipient_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_address: recipient_address.into(),
            recipient_key: recipient_key.into(),
            message: message.into(),
        }
    }

    /// Checks that every field is filled in and builds the request body.
    ///
    /// Fields go out exactly as entered.
    ///
    /// # Errors
    /// Returns the first missing field, in form order.
    pub fn to_request(&self) -> Result<SendRequest, ValidationError> {
        if self.recipient_address.is_empty() {
            return Err(ValidationError::MissingRecipientAddress);
        }
        if self.recipient_key.is_empty() {
            return Err(ValidationError::MissingRecipientKey);
        }
        if self.message.is_empty() {
            return Err(ValidationError::MissingMessage);
        }

        Ok(SendRequest {
            to_node: self.recipient_address.clone(),
            to_pub: self.recipient_key.clone(),
            message: self.message.clone(),
        })
    }

    pub fn clear_message(&mut self) {
        self.message.clear();
    }
}
