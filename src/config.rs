//! Node Bootstrap Configuration
//!
//! A node learns its identity and the initial cluster shape from the
//! environment: `ip_port` (this node's address), `VIEW` (comma-separated
//! address list), and `K` (replication factor). The process fails fast on a
//! non-positive `K` or a malformed view.

use anyhow::{bail, Context, Result};
use std::net::SocketAddr;

use crate::view::table::NodeAddr;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// This node's `host:port` identity, as it appears in the view.
    pub local: NodeAddr,
    /// Initial membership in declaration order; partition ids follow it.
    pub initial_view: Vec<NodeAddr>,
    /// Replicas per partition (K).
    pub replication_factor: usize,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self> {
        let ip_port = std::env::var("ip_port").context("ip_port environment variable not set")?;
        let view = std::env::var("VIEW").context("VIEW environment variable not set")?;
        let k = std::env::var("K").context("K environment variable not set")?;
        Self::from_parts(&ip_port, &view, &k)
    }

    pub fn from_parts(ip_port: &str, view: &str, k: &str) -> Result<Self> {
        let replication_factor: usize = k
            .trim()
            .parse()
            .with_context(|| format!("replication factor K is not an integer: '{k}'"))?;
        if replication_factor == 0 {
            bail!("replication factor K must be positive");
        }

        if !ip_port.contains(':') {
            bail!("node address '{ip_port}' is not of the form host:port");
        }
        let local = NodeAddr::new(ip_port.trim());

        let initial_view: Vec<NodeAddr> = view
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(NodeAddr::new)
            .collect();
        if initial_view.is_empty() {
            bail!("initial view is empty");
        }
        for entry in &initial_view {
            if !entry.0.contains(':') {
                bail!("view entry '{entry}' is not of the form host:port");
            }
        }
        if !initial_view.contains(&local) {
            tracing::warn!(
                "node {} is not part of its initial view; it must be added via view_update",
                local
            );
        }

        Ok(Self {
            local,
            initial_view,
            replication_factor,
        })
    }

    /// Socket address to serve on, derived from the local identity's port.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let port = self
            .local
            .0
            .rsplit(':')
            .next()
            .and_then(|p| p.parse::<u16>().ok())
            .with_context(|| format!("cannot parse port from '{}'", self.local))?;
        Ok(SocketAddr::new("0.0.0.0".parse()?, port))
    }
}
