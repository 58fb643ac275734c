//! Error types for node communication.

use nodeview_domain::error::SubmitError;
use thiserror::Error;

/// Errors from the REST client.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("node answered with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid node URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("no node found: {0}")]
    NotFound(String),
}

impl NodeError {
    /// Whether the request ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

impl From<NodeError> for SubmitError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Status { status, body } => SubmitError::Rejected { status, body },
            e if e.is_timeout() => SubmitError::Timeout,
            e => SubmitError::Network(e.to_string()),
        }
    }
}

/// Errors from the push channel.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid channel URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("malformed packet: {0}")]
    Malformed(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("namespace {namespace} refused the connection: {reason}")]
    ConnectRejected { namespace: String, reason: String },

    #[error("no heartbeat from the node within {0} ms")]
    HeartbeatTimeout(u64),

    #[error("channel is not connected")]
    NotConnected,
}
