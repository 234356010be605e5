use futures::stream::{FuturesUnordered, StreamExt};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use super::protocol::{KvReply, KvResponse};
use crate::clock::vector::VectorClock;
use crate::error::KvError;
use crate::store::memory::KeyStore;
use crate::store::record::Record;
use crate::view::table::{ClusterView, NodeAddr};

/// Per-peer timeout for point queries and forwarded requests.
const FANOUT_TIMEOUT: Duration = Duration::from_millis(500);
/// Timeout for introspection calls (cluster-wide key counting).
const INTROSPECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Keys are alphanumeric plus underscore, 1 to 250 characters.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 250
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Routes client reads and writes across partitions and replicas.
pub struct KvRouter {
    view: Arc<ClusterView>,
    store: Arc<KeyStore>,
    client: reqwest::Client,
}

impl KvRouter {
    pub fn new(view: Arc<ClusterView>, store: Arc<KeyStore>, client: reqwest::Client) -> Self {
        Self { view, store, client }
    }

    /// Client read: local hit, else first success of a cluster-wide fan-out.
    pub async fn read(&self, key: &str, payload: Option<&str>) -> Result<KvReply, KvError> {
        if !is_valid_key(key) {
            return Err(KvError::InvalidKey);
        }
        // validate any supplied causal context even though reads don't use it
        VectorClock::parse_or_zero(payload, self.view.replication_factor())?;

        if let Some(record) = self.store.get(key) {
            let pid = self.view.local_partition().await.ok_or(KvError::NodeNotFound)?;
            tracing::debug!("GET {key}: served locally from partition {pid}");
            return Ok(KvReply {
                created: false,
                body: KvResponse::read(pid, &record),
            });
        }

        match self.probe(key, payload).await {
            Some((peer, body)) => {
                tracing::debug!("GET {key}: relayed from {peer}");
                Ok(KvReply { created: false, body })
            }
            None => Err(KvError::KeyNotFound),
        }
    }

    /// Client write, as specified:
    /// 1. overwrite in place when the key already lives here,
    /// 2. otherwise forward to a discovered existing owner,
    /// 3. otherwise place the new key on a random partition.
    pub async fn write(
        &self,
        key: &str,
        value: &str,
        payload: Option<&str>,
    ) -> Result<KvReply, KvError> {
        if !is_valid_key(key) {
            return Err(KvError::InvalidKey);
        }
        let k = self.view.replication_factor();
        let base = VectorClock::parse_or_zero(payload, k)?;

        if self.store.has(key) {
            let pid = self.view.local_partition().await.ok_or(KvError::NodeNotFound)?;
            let position = self.view.local_position().await.ok_or(KvError::NodeNotFound)?;
            // the read-increment-write runs under the store's entry lock;
            // a key deleted in between falls through to discovery
            if let Some(result) = self.store.overwrite(key, value, position) {
                let record = result?;
                tracing::debug!("PUT {key}: replaced local record");
                return Ok(KvReply {
                    created: false,
                    body: KvResponse::written(pid, &record, true),
                });
            }
        }

        if let Some((owner, _)) = self.probe(key, payload).await {
            tracing::debug!("PUT {key}: forwarding to existing owner {owner}");
            return self.forward_write(&owner, key, value, payload).await;
        }

        // genuinely new key: place it on a uniformly random partition,
        // drawn from the ids actually present (removals can leave gaps)
        let partitions = self.view.partition_ids().await;
        if partitions.is_empty() {
            return Err(KvError::NodeNotFound);
        }
        let target = partitions[rand::thread_rng().gen_range(0..partitions.len())];

        if Some(target) == self.view.local_partition().await {
            let position = self.view.local_position().await.ok_or(KvError::NodeNotFound)?;
            let record = Record::new(value.to_string(), base.increment(position)?);
            let body = KvResponse::written(target, &record, false);
            self.store.put(key.to_string(), record);
            tracing::debug!("PUT {key}: created locally in partition {target}");
            return Ok(KvReply { created: true, body });
        }

        let members = self.view.members_of(target).await;
        let head = members
            .first()
            .ok_or_else(|| KvError::PeerUnreachable(format!("partition {target} has no members")))?;
        tracing::debug!("PUT {key}: placing on partition {target} via {head}");
        self.forward_add_key(head, key, value, payload).await
    }

    /// Internal `add_key`: materialize the record here, bypassing ownership
    /// discovery. Used by placement forwarding and key migration.
    pub async fn add_key(
        &self,
        key: &str,
        value: &str,
        payload: Option<&str>,
    ) -> Result<KvReply, KvError> {
        if !is_valid_key(key) {
            return Err(KvError::InvalidKey);
        }
        let pid = self.view.local_partition().await.ok_or(KvError::NodeNotFound)?;
        let position = self.view.local_position().await.ok_or(KvError::NodeNotFound)?;
        let base = VectorClock::parse_or_zero(payload, self.view.replication_factor())?;

        let record = Record::new(value.to_string(), base.increment(position)?);
        let replaced = self.store.put(key.to_string(), record.clone());
        Ok(KvReply {
            created: !replaced,
            body: KvResponse::written(pid, &record, replaced),
        })
    }

    /// Internal `get_key`: local-only lookup, no fan-out.
    pub async fn read_local(&self, key: &str) -> Result<KvResponse, KvError> {
        let record = self.store.get(key).ok_or(KvError::KeyNotFound)?;
        let pid = self.view.local_partition().await.ok_or(KvError::NodeNotFound)?;
        Ok(KvResponse::read(pid, &record))
    }

    /// Internal `remove_key`: local-only deletion, used by migration.
    pub fn remove_local(&self, key: &str) -> Result<(), KvError> {
        if self.store.delete(key) {
            Ok(())
        } else {
            Err(KvError::KeyNotFound)
        }
    }

    pub fn key_count(&self) -> usize {
        self.store.len()
    }

    /// Cluster-wide key count, counting each partition once: the local count
    /// for our own partition, and the first reachable member's count for
    /// every other.
    pub async fn total_key_count(&self) -> usize {
        let partitions = self.view.partition_ids().await;
        let local_pid = self.view.local_partition().await;
        let mut total = 0;

        for pid in partitions {
            if Some(pid) == local_pid {
                total += self.store.len();
                continue;
            }
            for member in self.view.members_of(pid).await {
                match self.fetch_key_count(&member).await {
                    Ok(count) => {
                        total += count;
                        break;
                    }
                    Err(e) => tracing::debug!("key count from {member} failed: {e}"),
                }
            }
        }
        total
    }

    /// Concurrent ownership probe across every other node in the view.
    /// First non-miss response wins; unreachable peers count as misses.
    async fn probe(&self, key: &str, payload: Option<&str>) -> Option<(NodeAddr, KvResponse)> {
        let peers = self.view.peers().await;
        let mut in_flight: FuturesUnordered<_> = peers
            .into_iter()
            .map(|peer| async move {
                let result = self.fetch_key(&peer, key, payload).await;
                (peer, result)
            })
            .collect();

        while let Some((peer, result)) = in_flight.next().await {
            match result {
                Ok(Some(body)) => return Some((peer, body)),
                Ok(None) => {}
                Err(e) => tracing::debug!("probe to {peer} failed: {e}"),
            }
        }
        None
    }

    /// Point query against one peer. `Ok(None)` means the peer does not hold
    /// the key; transport failures surface as `PeerUnreachable`.
    async fn fetch_key(
        &self,
        peer: &NodeAddr,
        key: &str,
        payload: Option<&str>,
    ) -> Result<Option<KvResponse>, KvError> {
        let response = self
            .client
            .get(format!("http://{peer}/kvs/get_key"))
            .query(&[("key", key), ("causal_payload", payload.unwrap_or(""))])
            .timeout(FANOUT_TIMEOUT)
            .send()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(KvError::PeerUnreachable(format!(
                "get_key on {peer} returned {}",
                response.status()
            )));
        }
        let body = response
            .json::<KvResponse>()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;
        Ok(Some(body))
    }

    /// Forwards a client write to the node that owns the key, relaying its
    /// response verbatim.
    async fn forward_write(
        &self,
        owner: &NodeAddr,
        key: &str,
        value: &str,
        payload: Option<&str>,
    ) -> Result<KvReply, KvError> {
        let response = self
            .client
            .put(format!("http://{owner}/kvs"))
            .query(&[
                ("key", key),
                ("value", value),
                ("causal_payload", payload.unwrap_or("")),
            ])
            .timeout(FANOUT_TIMEOUT)
            .send()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;

        let created = response.status() == reqwest::StatusCode::CREATED;
        let body = response
            .json::<KvResponse>()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;
        Ok(KvReply { created, body })
    }

    /// Hands a new key to a member of its target partition via `add_key`.
    async fn forward_add_key(
        &self,
        target: &NodeAddr,
        key: &str,
        value: &str,
        payload: Option<&str>,
    ) -> Result<KvReply, KvError> {
        let response = self
            .client
            .put(format!("http://{target}/kvs/add_key"))
            .query(&[
                ("key", key),
                ("value", value),
                ("causal_payload", payload.unwrap_or("")),
            ])
            .timeout(FANOUT_TIMEOUT)
            .send()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;

        let created = response.status() == reqwest::StatusCode::CREATED;
        let body = response
            .json::<KvResponse>()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;
        Ok(KvReply { created, body })
    }

    async fn fetch_key_count(&self, peer: &NodeAddr) -> Result<usize, KvError> {
        let response = self
            .client
            .get(format!("http://{peer}/kvs/get_number_of_keys"))
            .timeout(INTROSPECT_TIMEOUT)
            .send()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(KvError::PeerUnreachable(format!(
                "key count on {peer} returned {}",
                response.status()
            )));
        }
        let body = response
            .json::<super::protocol::KeyCountResponse>()
            .await
            .map_err(|e| KvError::PeerUnreachable(e.to_string()))?;
        Ok(body.count)
    }
}
