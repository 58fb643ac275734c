//! Picking the node to talk to.

use anyhow::{Context, Result};
use clap::Args;
use nodeview_protocols::discovery::{DISCOVERY_PORTS, discover_local_node, local_node_url, probe};
use nodeview_protocols::{DEFAULT_NODE_URL, NodeClient, NodeClientConfig};
use std::sync::Arc;
use tracing::info;

/// Node options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// Node base URL
    #[arg(long, global = true, env = "NODE_URL")]
    pub node: Option<String>,

    /// Probe only this local port instead of using a URL
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Probe local ports 5000-5009 when no node is given
    #[arg(long, global = true)]
    pub detect: bool,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    pub timeout: u64,
}

impl NodeArgs {
    pub fn selection(&self) -> NodeSelection {
        NodeSelection::from_args(self.node.clone(), self.port, self.detect)
    }

    /// Resolves the node and builds a client for it.
    ///
    /// # Errors
    /// Returns an error if no node could be selected or the URL is invalid.
    pub async fn client(&self) -> Result<Arc<NodeClient>> {
        let base_url = self.selection().resolve().await?;
        let config = NodeClientConfig::new(base_url).with_timeout_secs(self.timeout);
        Ok(Arc::new(NodeClient::new(config)?))
    }
}

/// Where the node URL comes from, in order of precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelection {
    /// `--node` or `NODE_URL`.
    Explicit(String),
    /// `--port`: only this local port is probed.
    Port(u16),
    /// `--detect`: local ports are probed in order.
    Detect,
    /// Nothing configured.
    Default,
}

impl NodeSelection {
    pub fn from_args(node: Option<String>, port: Option<u16>, detect: bool) -> Self {
        match (node.map(|n| n.trim().to_string()), port) {
            (Some(url), _) if !url.is_empty() => Self::Explicit(url),
            (_, Some(port)) => Self::Port(port),
            _ if detect => Self::Detect,
            _ => Self::Default,
        }
    }

    /// Turns the selection into a base URL, probing when asked to.
    ///
    /// # Errors
    /// Returns an error if probing found no node.
    pub async fn resolve(self) -> Result<String> {
        let url = match self {
            Self::Explicit(url) => url,
            Self::Default => DEFAULT_NODE_URL.to_string(),
            Self::Port(port) => {
                probe(&local_node_url(port))
                    .await
                    .with_context(|| format!("no node answered on port {port}"))?
                    .base_url
            }
            Self::Detect => discover_local_node(DISCOVERY_PORTS).await?.base_url,
        };

        info!(url = %url, "Using node");
        Ok(url)
    }
}
