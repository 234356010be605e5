use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::memory::KeyStore;
use crate::store::record::Record;
use crate::view::table::{ClusterView, NodeAddr};

/// Delay before the first push, giving the cluster time to come up.
const WARMUP_DELAY: Duration = Duration::from_secs(3);
/// Interval between push rounds.
const SYNC_INTERVAL: Duration = Duration::from_secs(3);
/// Per-peer timeout for a snapshot push.
const PUSH_TIMEOUT: Duration = Duration::from_millis(800);

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub msg: String,
    /// Number of keys adopted or replaced by the merge.
    pub adopted: usize,
}

/// The per-node anti-entropy daemon.
pub struct AntiEntropy {
    view: Arc<ClusterView>,
    store: Arc<KeyStore>,
    client: reqwest::Client,
}

impl AntiEntropy {
    pub fn new(view: Arc<ClusterView>, store: Arc<KeyStore>, client: reqwest::Client) -> Self {
        Self { view, store, client }
    }

    /// Spawns the single long-lived daemon task for this node.
    pub fn start(self: &Arc<Self>) {
        let daemon = Arc::clone(self);
        tokio::spawn(async move {
            tracing::info!("anti-entropy daemon starting");
            tokio::time::sleep(WARMUP_DELAY).await;
            let mut interval = tokio::time::interval(SYNC_INTERVAL);
            loop {
                interval.tick().await;
                daemon.push_round().await;
            }
        });
    }

    /// One tick: push the full local store to every partition mate.
    pub async fn push_round(&self) {
        let peers = self.view.partition_peers().await;
        if peers.is_empty() {
            return;
        }
        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            return;
        }

        let pushes = peers.into_iter().map(|peer| {
            let client = self.client.clone();
            let snapshot = &snapshot;
            async move {
                let result = client
                    .put(format!("http://{peer}/kvs/sync"))
                    .json(snapshot)
                    .timeout(PUSH_TIMEOUT)
                    .send()
                    .await;
                match result {
                    Ok(response) if response.status().is_success() => {
                        tracing::debug!("pushed snapshot to {peer}");
                    }
                    Ok(response) => {
                        tracing::debug!("sync push to {peer} returned {}", response.status());
                    }
                    Err(e) => tracing::debug!("sync push to {peer} failed: {e}"),
                }
            }
        });
        join_all(pushes).await;
    }

    /// Merges a snapshot pushed by a partition mate. Returns the number of
    /// keys adopted or replaced.
    pub fn apply_snapshot(&self, snapshot: HashMap<String, Record>) -> usize {
        let mut adopted = 0;
        for (key, incoming) in snapshot {
            if self.store.merge(key, incoming) {
                adopted += 1;
            }
        }
        if adopted > 0 {
            tracing::debug!("anti-entropy merge adopted {adopted} records");
        }
        adopted
    }
}

/// Helper for peers pushing to us; kept next to the daemon so the push and
/// merge sides of the protocol stay in one place.
pub type Snapshot = HashMap<String, Record>;
