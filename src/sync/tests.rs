//! Sync Module Tests
//!
//! Validates the receive side of the anti-entropy protocol: snapshot merges
//! and convergence between partition mates.
//!
//! *Note: the push side needs a running HTTP server on the peer and is
//! covered by the integration tests in `tests/`.*

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::clock::vector::VectorClock;
    use crate::store::memory::KeyStore;
    use crate::store::record::Record;
    use crate::sync::daemon::AntiEntropy;
    use crate::view::table::{ClusterView, NodeAddr};

    fn daemon_with_store(local: &str, seeds: &[&str]) -> (AntiEntropy, Arc<KeyStore>) {
        let seeds: Vec<NodeAddr> = seeds.iter().map(|a| NodeAddr::new(*a)).collect();
        let view = Arc::new(ClusterView::new(NodeAddr::new(local), 2, &seeds));
        let store = Arc::new(KeyStore::new());
        let daemon = AntiEntropy::new(view, store.clone(), reqwest::Client::new());
        (daemon, store)
    }

    fn record(value: &str, entries: &[u64], timestamp: u64) -> Record {
        let payload = entries
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(".");
        Record {
            value: value.to_string(),
            clock: VectorClock::parse(&payload, entries.len()).unwrap(),
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_apply_snapshot_adopts_unknown_keys() {
        let (daemon, store) = daemon_with_store("a:1", &["a:1", "b:1"]);

        let mut snapshot = HashMap::new();
        snapshot.insert("foo".to_string(), record("bar", &[0, 1], 10));
        snapshot.insert("qux".to_string(), record("zap", &[0, 2], 11));

        assert_eq!(daemon.apply_snapshot(snapshot), 2);
        assert_eq!(store.get("foo").unwrap().value, "bar");
        assert_eq!(store.get("qux").unwrap().value, "zap");
    }

    #[tokio::test]
    async fn test_apply_snapshot_respects_dominance() {
        let (daemon, store) = daemon_with_store("a:1", &["a:1", "b:1"]);
        store.put("foo".to_string(), record("newer", &[2, 1], 5));
        store.put("bar".to_string(), record("older", &[1, 0], 5));

        let mut snapshot = HashMap::new();
        snapshot.insert("foo".to_string(), record("stale", &[1, 1], 50));
        snapshot.insert("bar".to_string(), record("fresh", &[1, 1], 50));

        assert_eq!(daemon.apply_snapshot(snapshot), 1);
        assert_eq!(store.get("foo").unwrap().value, "newer");
        assert_eq!(store.get("bar").unwrap().value, "fresh");
    }

    #[tokio::test]
    async fn test_apply_snapshot_breaks_concurrency_by_timestamp() {
        let (daemon, store) = daemon_with_store("a:1", &["a:1", "b:1"]);
        store.put("foo".to_string(), record("mine", &[2, 0], 100));

        let mut snapshot = HashMap::new();
        snapshot.insert("foo".to_string(), record("theirs", &[0, 2], 200));

        assert_eq!(daemon.apply_snapshot(snapshot), 1);
        assert_eq!(store.get("foo").unwrap().value, "theirs");
    }

    #[tokio::test]
    async fn test_repeated_snapshots_converge() {
        // after enough ticks with no further writes, both replicas agree on
        // every key present in either
        let (left, left_store) = daemon_with_store("a:1", &["a:1", "b:1"]);
        let (right, right_store) = daemon_with_store("b:1", &["a:1", "b:1"]);

        left_store.put("x".to_string(), record("lx", &[1, 0], 1));
        right_store.put("y".to_string(), record("ry", &[0, 1], 2));
        left_store.put("z".to_string(), record("lz", &[1, 0], 30));
        right_store.put("z".to_string(), record("rz", &[0, 1], 40));

        // two rounds in each direction, as successive ticks would produce
        for _ in 0..2 {
            right.apply_snapshot(left_store.snapshot());
            left.apply_snapshot(right_store.snapshot());
        }

        assert_eq!(left_store.len(), 3);
        assert_eq!(right_store.len(), 3);
        for key in ["x", "y", "z"] {
            assert_eq!(left_store.get(key), right_store.get(key), "diverged on {key}");
        }
        // concurrent writes to z resolved by the larger timestamp
        assert_eq!(left_store.get("z").unwrap().value, "rz");
    }

    #[tokio::test]
    async fn test_push_round_without_peers_is_a_no_op() {
        let (daemon, store) = daemon_with_store("a:1", &["a:1"]);
        store.put("foo".to_string(), record("bar", &[1, 0], 1));

        // sole member of its partition: nothing to push, returns immediately
        daemon.push_round().await;
        assert_eq!(store.len(), 1);
    }
}
