//! Cluster Integration Tests
//!
//! Boots real nodes (full HTTP surface plus anti-entropy daemon) on loopback
//! ports and drives them through the client API, covering the network paths
//! the unit tests leave out: replication convergence, the join/leave
//! protocol, and migration on departure.

use causal_kvs::config::NodeConfig;
use causal_kvs::server::{build_node, http_app};
use serde_json::Value;
use std::time::Duration;

/// Reserves a loopback port. The listener is dropped before the node binds,
/// which is racy in principle but fine for test purposes.
fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Starts a full node on `addr` and serves it in the background.
async fn spawn_node(addr: &str, view: &str, k: usize) {
    let config = NodeConfig::from_parts(addr, view, &k.to_string()).unwrap();
    let node = build_node(&config);
    node.anti_entropy.start();
    let app = http_app(&node);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
}

fn payload_entries(body: &Value) -> Vec<u64> {
    body["causal_payload"]
        .as_str()
        .unwrap()
        .split('.')
        .map(|t| t.parse().unwrap())
        .collect()
}

#[tokio::test]
async fn writes_replicate_across_partition_mates() {
    let addr_a = format!("127.0.0.1:{}", free_port());
    let addr_b = format!("127.0.0.1:{}", free_port());
    let view = format!("{addr_a},{addr_b}");

    // one partition, two replicas
    spawn_node(&addr_a, &view, 2).await;
    spawn_node(&addr_b, &view, 2).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();

    // first write creates the key (both nodes sit in the only partition, so
    // placement is local to one of them)
    let response = client
        .put(format!("http://{addr_a}/kvs"))
        .query(&[("key", "foo"), ("value", "bar"), ("causal_payload", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "success");
    assert_eq!(body["replaced"], false);
    let first_clock = payload_entries(&body);
    assert_eq!(first_clock.len(), 2);
    assert_eq!(first_clock.iter().sum::<u64>(), 1);

    // second write replaces it and its clock dominates the first
    let response = client
        .put(format!("http://{addr_a}/kvs"))
        .query(&[("key", "foo"), ("value", "baz"), ("causal_payload", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["replaced"], true);
    let second_clock = payload_entries(&body);
    assert!(second_clock
        .iter()
        .zip(first_clock.iter())
        .all(|(s, f)| s >= f));
    assert_eq!(second_clock.iter().sum::<u64>(), 2);

    // after a couple of anti-entropy ticks the partition mate can serve the
    // key from its own store
    tokio::time::sleep(Duration::from_secs(8)).await;
    let response = client
        .get(format!("http://{addr_b}/kvs"))
        .query(&[("key", "foo")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["value"], "baz");

    let counts: Value = client
        .get(format!("http://{addr_b}/kvs/get_number_of_keys"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(counts["count"], 1);
}

#[tokio::test]
async fn reads_fan_out_to_the_owning_node() {
    let addr_a = format!("127.0.0.1:{}", free_port());
    let addr_b = format!("127.0.0.1:{}", free_port());
    let view = format!("{addr_a},{addr_b}");

    // two singleton partitions: no replication between a and b
    spawn_node(&addr_a, &view, 1).await;
    spawn_node(&addr_b, &view, 1).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();

    // plant the key directly on b, bypassing placement
    let response = client
        .put(format!("http://{addr_b}/kvs/add_key"))
        .query(&[("key", "planted"), ("value", "42"), ("causal_payload", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // a read on a misses locally and relays b's record
    let response = client
        .get(format!("http://{addr_a}/kvs"))
        .query(&[("key", "planted")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["value"], "42");
    assert_eq!(body["partition_id"], 1);

    // a write through a must update b's copy, not create a second owner
    let response = client
        .put(format!("http://{addr_a}/kvs"))
        .query(&[("key", "planted"), ("value", "43"), ("causal_payload", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["replaced"], true);

    let counts: Value = client
        .get(format!("http://{addr_a}/kvs/get_number_of_keys"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(counts["count"], 0, "the non-owner must not keep a copy");

    // cluster-wide count sees exactly one key
    let totals: Value = client
        .get(format!("http://{addr_a}/kvs/total_number_of_keys"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(totals["total"], 1);

    // a miss everywhere is a 404
    let response = client
        .get(format!("http://{addr_a}/kvs"))
        .query(&[("key", "ghost")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn drain_reaches_survivors_with_noncontiguous_partition_ids() {
    let addr_a = format!("127.0.0.1:{}", free_port());
    let addr_b = format!("127.0.0.1:{}", free_port());
    let view = format!("{addr_a},{addr_b}");

    // a is the sole replica of partition 0; the only surviving partition
    // after its departure is id 1, so 0-based target draws would find no
    // members and drop every key
    spawn_node(&addr_a, &view, 1).await;
    spawn_node(&addr_b, &view, 1).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();

    let response = client
        .put(format!("http://{addr_a}/kvs/add_key"))
        .query(&[("key", "keeper"), ("value", "held"), ("causal_payload", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // tell a to drain as a departing node would
    let response = client
        .put(format!("http://{addr_a}/kvs/send_data"))
        .query(&[("ip_port", addr_b.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // the key must now live on b itself, not merely be reachable through a
    let response = client
        .get(format!("http://{addr_b}/kvs/get_key"))
        .query(&[("key", "keeper")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["value"], "held");
}

#[tokio::test]
async fn join_extends_partitions_and_leave_preserves_keys() {
    let addr_a = format!("127.0.0.1:{}", free_port());
    let addr_b = format!("127.0.0.1:{}", free_port());

    // a starts alone; b boots with only itself and learns the real view on join
    spawn_node(&addr_a, &addr_a, 1).await;
    spawn_node(&addr_b, &addr_b, 1).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();

    // join: b becomes partition 1
    let response = client
        .put(format!("http://{addr_a}/kvs/view_update"))
        .query(&[("type", "add"), ("ip_port", addr_b.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["partition_id"], 1);
    assert_eq!(body["number_of_partitions"], 2);

    // the joining node derived its own partition id from the pushed view
    let body: Value = client
        .get(format!("http://{addr_b}/kvs/get_partition_id"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["partition_id"], 1);

    let body: Value = client
        .get(format!("http://{addr_a}/kvs/get_all_partition_ids"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["partition_id_list"], serde_json::json!([0, 1]));

    let body: Value = client
        .get(format!("http://{addr_a}/kvs/get_partition_members"))
        .query(&[("partition_id", "1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["partition_members"], serde_json::json!([addr_b]));

    // plant a key on b, the sole replica of partition 1
    let response = client
        .put(format!("http://{addr_b}/kvs/add_key"))
        .query(&[("key", "survivor"), ("value", "v42"), ("causal_payload", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // leave: b must drain its keys into the surviving partition first
    let response = client
        .put(format!("http://{addr_a}/kvs/view_update"))
        .query(&[("type", "remove"), ("ip_port", addr_b.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["number_of_partitions"], 1);

    // no key lost: the drained key is now served by a
    let response = client
        .get(format!("http://{addr_a}/kvs"))
        .query(&[("key", "survivor")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["value"], "v42");

    // removing an unknown node is an error for the coordinator
    let response = client
        .put(format!("http://{addr_a}/kvs/view_update"))
        .query(&[("type", "remove"), ("ip_port", "10.9.9.9:1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
