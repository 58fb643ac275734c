//! Error types for the execution layer.

use nodeview_domain::error::{SubmitError, ValidationError};
use thiserror::Error;

/// Misuse of the synchronizer lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("synchronizer is already initialized, tear it down first")]
    AlreadyInitialized,
    #[error("synchronizer is not initialized")]
    NotInitialized,
}

/// Why a submit did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}
