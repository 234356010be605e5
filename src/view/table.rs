use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::RwLock;

/// A node's identity on the wire: its `host:port` address string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddr(pub String);

impl NodeAddr {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared cluster membership table mapping node address to partition id.
///
/// The ordered map keeps addresses lexicographically sorted, so every
/// derived member list comes out in canonical vector-clock order for free.
pub struct ClusterView {
    local: NodeAddr,
    replication_factor: usize,
    nodes: RwLock<BTreeMap<NodeAddr, u32>>,
}

impl ClusterView {
    /// Builds the initial view from the seed list, assigning partition ids in
    /// list order: nodes `i` with equal `i / K` share a partition.
    pub fn new(local: NodeAddr, replication_factor: usize, seeds: &[NodeAddr]) -> Self {
        let mut nodes = BTreeMap::new();
        for (i, addr) in seeds.iter().enumerate() {
            nodes.insert(addr.clone(), (i / replication_factor) as u32);
        }
        Self {
            local,
            replication_factor,
            nodes: RwLock::new(nodes),
        }
    }

    pub fn local_addr(&self) -> &NodeAddr {
        &self.local
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn contains(&self, addr: &NodeAddr) -> bool {
        self.nodes.read().await.contains_key(addr)
    }

    /// `ceil(|view| / K)`.
    pub async fn partition_count(&self) -> u32 {
        let len = self.nodes.read().await.len();
        ((len + self.replication_factor - 1) / self.replication_factor) as u32
    }

    /// Distinct partition ids present in the view, ascending. Removals can
    /// leave gaps, so the ids are not necessarily `0..partition_count`.
    pub async fn partition_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.nodes.read().await.values().copied().collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub async fn partition_of(&self, addr: &NodeAddr) -> Option<u32> {
        self.nodes.read().await.get(addr).copied()
    }

    pub async fn local_partition(&self) -> Option<u32> {
        self.partition_of(&self.local).await
    }

    /// Members of a partition in lexicographic order.
    pub async fn members_of(&self, partition_id: u32) -> Vec<NodeAddr> {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|(_, pid)| **pid == partition_id)
            .map(|(addr, _)| addr.clone())
            .collect()
    }

    /// This node's index within its partition's sorted membership, which is
    /// the only vector-clock position it may increment.
    pub async fn local_position(&self) -> Option<usize> {
        let nodes = self.nodes.read().await;
        let pid = *nodes.get(&self.local)?;
        nodes
            .iter()
            .filter(|(_, p)| **p == pid)
            .position(|(addr, _)| addr == &self.local)
    }

    /// Every node in the view except this one.
    pub async fn peers(&self) -> Vec<NodeAddr> {
        self.nodes
            .read()
            .await
            .keys()
            .filter(|addr| **addr != self.local)
            .cloned()
            .collect()
    }

    /// Partition mates of this node, excluding itself. Empty when the node is
    /// not in the view or is the sole replica.
    pub async fn partition_peers(&self) -> Vec<NodeAddr> {
        let nodes = self.nodes.read().await;
        let Some(pid) = nodes.get(&self.local).copied() else {
            return Vec::new();
        };
        nodes
            .iter()
            .filter(|(addr, p)| **p == pid && **addr != self.local)
            .map(|(addr, _)| addr.clone())
            .collect()
    }

    /// Adds a node, assigning the next partition id (`floor(|view| / K)`).
    /// Idempotent: re-adding returns the existing assignment. Returns the
    /// node's partition id.
    pub async fn add_node(&self, addr: NodeAddr) -> u32 {
        let mut nodes = self.nodes.write().await;
        if let Some(existing) = nodes.get(&addr) {
            return *existing;
        }
        let pid = (nodes.len() / self.replication_factor) as u32;
        nodes.insert(addr, pid);
        pid
    }

    /// Removes a node, returning whether it was present. Removal of an absent
    /// node is a no-op for peers replaying a broadcast.
    pub async fn remove_node(&self, addr: &NodeAddr) -> bool {
        self.nodes.write().await.remove(addr).is_some()
    }

    /// Drops this node from its own view, used while redistributing keys
    /// before departure so the node never targets itself.
    pub async fn remove_local(&self) -> bool {
        self.remove_node(&self.local.clone()).await
    }

    /// Replaces the whole table with a view pushed by a peer (`accept_view`).
    pub async fn replace(&self, incoming: BTreeMap<NodeAddr, u32>) {
        *self.nodes.write().await = incoming;
    }

    pub async fn snapshot(&self) -> BTreeMap<NodeAddr, u32> {
        self.nodes.read().await.clone()
    }
}
