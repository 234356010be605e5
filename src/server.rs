//! Node Assembly
//!
//! Wires the shared tables and services of one node together and builds the
//! HTTP surface. `main.rs` and the integration tests both go through this
//! module so a test node is exactly a production node on a different port.

use axum::{
    routing::{get, put},
    Extension, Router,
};
use std::sync::Arc;

use crate::config::NodeConfig;
use crate::rebalance::handlers::{
    handle_accept_view, handle_add_node, handle_remove_node, handle_send_data, handle_view_update,
};
use crate::rebalance::service::Rebalancer;
use crate::router::handlers::{
    handle_add_key, handle_get_key, handle_key_count, handle_kv_read, handle_kv_write,
    handle_remove_key, handle_total_key_count,
};
use crate::router::service::KvRouter;
use crate::store::memory::KeyStore;
use crate::sync::daemon::AntiEntropy;
use crate::sync::handlers::handle_sync;
use crate::view::handlers::{
    handle_all_partition_ids, handle_partition_id, handle_partition_members, handle_print_view,
};
use crate::view::table::ClusterView;

/// One node's assembled services, sharing the view and store tables.
pub struct NodeHandle {
    pub view: Arc<ClusterView>,
    pub store: Arc<KeyStore>,
    pub router: Arc<KvRouter>,
    pub rebalancer: Arc<Rebalancer>,
    pub anti_entropy: Arc<AntiEntropy>,
}

pub fn build_node(config: &NodeConfig) -> NodeHandle {
    let view = Arc::new(ClusterView::new(
        config.local.clone(),
        config.replication_factor,
        &config.initial_view,
    ));
    let store = Arc::new(KeyStore::new());
    let client = reqwest::Client::new();

    let router = Arc::new(KvRouter::new(view.clone(), store.clone(), client.clone()));
    let rebalancer = Arc::new(Rebalancer::new(view.clone(), store.clone(), client.clone()));
    let anti_entropy = Arc::new(AntiEntropy::new(view.clone(), store.clone(), client));

    NodeHandle {
        view,
        store,
        router,
        rebalancer,
        anti_entropy,
    }
}

/// Full HTTP surface of a node: the client-facing `/kvs` routes, the
/// peer-to-peer membership and migration routes, and introspection.
pub fn http_app(node: &NodeHandle) -> Router {
    Router::new()
        .route("/kvs", get(handle_kv_read).put(handle_kv_write).post(handle_kv_write))
        .route("/kvs/get_key", get(handle_get_key))
        .route("/kvs/add_key", put(handle_add_key).post(handle_add_key))
        .route("/kvs/remove_key", put(handle_remove_key))
        .route("/kvs/get_number_of_keys", get(handle_key_count))
        .route("/kvs/total_number_of_keys", get(handle_total_key_count))
        .route("/kvs/view_update", put(handle_view_update).post(handle_view_update))
        .route("/kvs/add_node", put(handle_add_node))
        .route("/kvs/remove_node", put(handle_remove_node))
        .route("/kvs/accept_view", put(handle_accept_view))
        .route("/kvs/send_data", put(handle_send_data))
        .route("/kvs/get_partition_members", get(handle_partition_members))
        .route("/kvs/get_partition_id", get(handle_partition_id))
        .route("/kvs/get_all_partition_ids", get(handle_all_partition_ids))
        .route("/kvs/print_view", get(handle_print_view))
        .route("/kvs/sync", put(handle_sync).post(handle_sync))
        .layer(Extension(node.view.clone()))
        .layer(Extension(node.router.clone()))
        .layer(Extension(node.rebalancer.clone()))
        .layer(Extension(node.anti_entropy.clone()))
}
