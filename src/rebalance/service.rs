use futures::future::join_all;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::KvError;
use crate::store::memory::KeyStore;
use crate::view::table::{ClusterView, NodeAddr};

/// Timeout for membership broadcasts (`add_node`, `remove_node`,
/// `accept_view`, `send_data`).
const BROADCAST_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for per-key migration calls (`add_key`, `remove_key`).
const MIGRATE_TIMEOUT: Duration = Duration::from_secs(3);
/// Settling delay before a join response, letting broadcasts land.
const JOIN_SETTLE: Duration = Duration::from_secs(3);
/// Settling delay before a leave response.
const LEAVE_SETTLE: Duration = Duration::from_secs(2);
/// Below this many local keys a join triggers no migration.
const MIGRATION_THRESHOLD: usize = 10;

#[derive(Debug)]
pub struct JoinOutcome {
    pub partition_id: u32,
    pub number_of_partitions: u32,
}

/// Executes view-update requests: join/leave announcement, view hand-off,
/// and key migration.
pub struct Rebalancer {
    view: Arc<ClusterView>,
    store: Arc<KeyStore>,
    client: reqwest::Client,
}

impl Rebalancer {
    pub fn new(view: Arc<ClusterView>, store: Arc<KeyStore>, client: reqwest::Client) -> Self {
        Self { view, store, client }
    }

    /// Join protocol, run on the node that received the view-update request.
    pub async fn join(&self, addr: NodeAddr) -> Result<JoinOutcome, KvError> {
        // a membership count that is an exact multiple of K means this join
        // starts a brand-new partition
        let starts_new_partition =
            self.view.len().await % self.view.replication_factor() == 0;

        self.broadcast("add_node", &addr).await;
        let partition_id = self.view.add_node(addr.clone()).await;
        tracing::info!("node {addr} joined partition {partition_id}");

        // hand the full view to the newcomer so it can derive its own
        // partition id and clock position
        self.push_view(&addr).await?;

        if starts_new_partition && self.store.len() > MIGRATION_THRESHOLD {
            self.share_keys(&addr).await;
        }

        tokio::time::sleep(JOIN_SETTLE).await;
        Ok(JoinOutcome {
            partition_id,
            number_of_partitions: self.view.partition_count().await,
        })
    }

    /// Leave protocol. Fails with `NodeNotFound` when the node is not in the
    /// view of the coordinator handling the request.
    pub async fn leave(&self, addr: &NodeAddr) -> Result<u32, KvError> {
        let partition_id = self
            .view
            .partition_of(addr)
            .await
            .ok_or(KvError::NodeNotFound)?;
        let replicas = self.view.members_of(partition_id).await.len();

        self.view.remove_node(addr).await;
        tracing::info!("node {addr} left partition {partition_id}");
        self.broadcast("remove_node", addr).await;

        if replicas == 1 {
            // sole replica: the departing node must offload every key before
            // the client hears back, or the partition's data is gone
            tracing::info!("{addr} was the last replica of partition {partition_id}, draining it");
            let url = format!("http://{addr}/kvs/send_data");
            let result = self
                .client
                .put(url)
                .query(&[("ip_port", self.view.local_addr().0.as_str())])
                .timeout(BROADCAST_TIMEOUT)
                .send()
                .await;
            if let Err(e) = result {
                tracing::warn!("send_data to departing node {addr} failed: {e}");
            }
        }

        tokio::time::sleep(LEAVE_SETTLE).await;
        Ok(self.view.partition_count().await)
    }

    /// Adopts a full view pushed by a peer (`accept_view`).
    pub async fn accept_view(&self, incoming: BTreeMap<NodeAddr, u32>) {
        tracing::info!("accepting pushed view with {} nodes", incoming.len());
        self.view.replace(incoming).await;
    }

    /// Drains this node's store into the surviving partitions, called on the
    /// departing sole replica via `send_data`. Returns the number of keys
    /// moved.
    pub async fn redistribute(&self) -> usize {
        // drop ourselves from our own view first so we never pick our own
        // partition as a target; the surviving ids may have gaps after
        // earlier removals, so draw from the ids actually present
        self.view.remove_local().await;
        let partitions = self.view.partition_ids().await;
        if partitions.is_empty() {
            tracing::warn!("no surviving partitions to redistribute to");
            return 0;
        }

        let mut moved = 0;
        for (key, record) in self.store.snapshot() {
            let target = partitions[rand::thread_rng().gen_range(0..partitions.len())];
            let members = self.view.members_of(target).await;
            let Some(head) = members.first() else {
                tracing::warn!("partition {target} has no members, skipping {key}");
                continue;
            };
            match self.push_key(head, &key, &record.value).await {
                Ok(()) => moved += 1,
                Err(e) => tracing::warn!("failed to move {key} to {head}: {e}"),
            }
        }
        tracing::info!("redistributed {moved} keys before departure");
        moved
    }

    /// Moves roughly half of the local keys to a freshly joined node, keeping
    /// sibling replicas in step by deleting the moved keys from them.
    async fn share_keys(&self, target: &NodeAddr) {
        let keys = self.store.keys();
        let move_count = keys.len() / 2 + 1;
        let siblings = self.view.partition_peers().await;
        tracing::info!("sharing {move_count} of {} keys with {target}", keys.len());

        for key in keys.into_iter().take(move_count) {
            let Some(record) = self.store.get(&key) else {
                continue;
            };
            // only drop the local copy once the newcomer acknowledged it
            match self.push_key(target, &key, &record.value).await {
                Ok(()) => {
                    self.store.delete(&key);
                    for sibling in &siblings {
                        if let Err(e) = self.drop_key(sibling, &key).await {
                            tracing::warn!("remove_key for {key} on {sibling} failed: {e}");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("migration of {key} to {target} failed, keeping it: {e}");
                }
            }
        }
    }

    /// Best-effort concurrent broadcast of a view mutation to every peer.
    async fn broadcast(&self, endpoint: &str, subject: &NodeAddr) {
        let peers = self.view.peers().await;
        let calls = peers.into_iter().map(|peer| {
            let client = self.client.clone();
            let url = format!("http://{peer}/kvs/{endpoint}");
            let subject = subject.0.clone();
            async move {
                let result = client
                    .put(url)
                    .query(&[("ip_port", subject.as_str())])
                    .timeout(BROADCAST_TIMEOUT)
                    .send()
                    .await;
                if let Err(e) = result {
                    tracing::warn!("{endpoint} broadcast to {peer} failed: {e}");
                }
            }
        });
        join_all(calls).await;
    }

    /// Pushes the entire local view to a joining node.
    async fn push_view(&self, target: &NodeAddr) -> Result<(), KvError> {
        let snapshot = self.view.snapshot().await;
        let response = self
            .client
            .put(format!("http://{target}/kvs/accept_view"))
            .json(&snapshot)
            .timeout(BROADCAST_TIMEOUT)
            .send()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(KvError::PeerUnreachable(format!(
                "accept_view on {target} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Migration write: the receiving node mints a fresh causal context for
    /// the key, matching the original protocol's empty-payload hand-off.
    async fn push_key(&self, target: &NodeAddr, key: &str, value: &str) -> Result<(), KvError> {
        let response = self
            .client
            .put(format!("http://{target}/kvs/add_key"))
            .query(&[("key", key), ("value", value), ("causal_payload", "")])
            .timeout(MIGRATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(KvError::PeerUnreachable(format!(
                "add_key on {target} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn drop_key(&self, target: &NodeAddr, key: &str) -> Result<(), KvError> {
        let response = self
            .client
            .put(format!("http://{target}/kvs/remove_key"))
            .query(&[("key", key)])
            .timeout(MIGRATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;
        // a sibling that never had the key is already in the desired state
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(KvError::PeerUnreachable(format!(
                "remove_key on {target} returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
