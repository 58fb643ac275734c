//! Finding a node on the local machine.

use crate::NodeApi;
use crate::error::NodeError;
use crate::http::{NodeClient, NodeClientConfig};
use nodeview_domain::entities::Identity;
use std::ops::Range;
use tracing::{debug, info};

/// Ports probed when no node is configured.
pub const DISCOVERY_PORTS: Range<u16> = 5000..5010;

/// Probe timeout in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 1;

/// A node that answered its identity endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredNode {
    /// Base URL of the node.
    pub base_url: String,
    /// Identity it reported.
    pub identity: Identity,
}

/// Local node URL for a port.
#[must_use]
pub fn local_node_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

/// Checks whether a node answers at `base_url`.
///
/// # Errors
/// Returns an error if the node is unreachable or answers non-2xx.
pub async fn probe(base_url: &str) -> Result<DiscoveredNode, NodeError> {
    let config = NodeClientConfig::new(base_url).with_timeout_secs(PROBE_TIMEOUT_SECS);
    let client = NodeClient::new(config)?;
    let identity = client.identity().await?;

    Ok(DiscoveredNode {
        base_url: client.base_url().to_string(),
        identity,
    })
}

/// Probes local ports in order and returns the first node that answers.
///
/// # Errors
/// Returns [`NodeError::NotFound`] if no port answered.
pub async fn discover_local_node(
    ports: impl IntoIterator<Item = u16>,
) -> Result<DiscoveredNode, NodeError> {
    let mut probed = Vec::new();

    for port in ports {
        let url = local_node_url(port);
        match probe(&url).await {
            Ok(node) => {
                info!(url = %node.base_url, "Found node");
                return Ok(node);
            }
            Err(e) => {
                debug!(url = %url, error = %e, "No node");
                probed.push(port.to_string());
            }
        }
    }

    Err(NodeError::NotFound(format!(
        "nothing answered on 127.0.0.1 ports [{}]",
        probed.join(", ")
    )))
}
