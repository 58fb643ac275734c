//! HTTP client for the node's REST endpoints.

use crate::NodeApi;
use crate::error::NodeError;
use async_trait::async_trait;
use nodeview_domain::entities::{Block, Identity, Peer, Transaction};
use nodeview_domain::value_objects::SendRequest;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Node address used when nothing else is configured.
pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:5000";

/// Configuration for the REST client.
#[derive(Debug, Clone)]
pub struct NodeClientConfig {
    /// Base URL of the node.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NodeClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NODE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl NodeClientConfig {
    /// Creates a configuration for the given node with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Result of asking the node to mine.
#[derive(Debug, Clone, PartialEq)]
pub enum MineOutcome {
    /// A block was mined and broadcast.
    Mined(Block),
    /// The node had no pending transactions.
    NothingToMine(String),
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

/// Client for the node's REST API.
#[derive(Clone)]
pub struct NodeClient {
    /// Base URL without trailing slash.
    base_url: String,
    /// HTTP client.
    client: Client,
}

impl NodeClient {
    /// Creates a new client.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or the HTTP client cannot
    /// be built.
    pub fn new(config: NodeClientConfig) -> Result<Self, NodeError> {
        url::Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(config.base_url, client))
    }

    /// Creates a client around an existing `reqwest` client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns non-2xx responses into [`NodeError::Status`].
    async fn check(response: Response) -> Result<Response, NodeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(NodeError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NodeError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self.client.get(&url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Fetches the node's peer list.
    pub async fn peers(&self) -> Result<Vec<Peer>, NodeError> {
        self.get_json("/peers").await
    }

    /// Fetches the full chain, oldest block first.
    pub async fn chain(&self) -> Result<Vec<Block>, NodeError> {
        self.get_json("/chain").await
    }

    /// Fetches the node's pending transactions, oldest first.
    pub async fn pending(&self) -> Result<Vec<Transaction>, NodeError> {
        self.get_json("/pending").await
    }

    /// Asks the node to mine its pending transactions into a block.
    pub async fn mine(&self) -> Result<MineOutcome, NodeError> {
        let url = self.url("/mine");
        info!(url = %url, "Requesting block");

        let response = Self::check(self.client.post(&url).send().await?).await?;

        if response.status() == StatusCode::CREATED {
            Ok(MineOutcome::Mined(response.json().await?))
        } else {
            let body: MessageResponse = response.json().await?;
            Ok(MineOutcome::NothingToMine(body.message))
        }
    }
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn identity(&self) -> Result<Identity, NodeError> {
        self.get_json("/id").await
    }

    async fn send(&self, request: &SendRequest) -> Result<(), NodeError> {
        let url = self.url("/send");
        debug!(url = %url, to_node = %request.to_node, "POST");

        let response = self.client.post(&url).json(request).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
