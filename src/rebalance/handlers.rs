use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::protocol::{
    AckResponse, NodeParams, SendDataParams, ViewUpdateParams, ViewUpdateResponse,
};
use super::service::Rebalancer;
use crate::view::table::{ClusterView, NodeAddr};

/// Client-facing view update: dispatches to the join or leave protocol.
pub async fn handle_view_update(
    Extension(rebalancer): Extension<Arc<Rebalancer>>,
    Query(params): Query<ViewUpdateParams>,
) -> (StatusCode, Json<ViewUpdateResponse>) {
    let addr = NodeAddr::new(params.ip_port);
    match params.update_type.as_str() {
        "add" => match rebalancer.join(addr).await {
            Ok(outcome) => (
                StatusCode::OK,
                Json(ViewUpdateResponse {
                    msg: "success".to_string(),
                    error: None,
                    partition_id: Some(outcome.partition_id),
                    number_of_partitions: Some(outcome.number_of_partitions),
                }),
            ),
            Err(e) => (e.status(), Json(ViewUpdateResponse::error(e.to_string()))),
        },
        "remove" => match rebalancer.leave(&addr).await {
            Ok(number_of_partitions) => (
                StatusCode::OK,
                Json(ViewUpdateResponse {
                    msg: "success".to_string(),
                    error: None,
                    partition_id: None,
                    number_of_partitions: Some(number_of_partitions),
                }),
            ),
            Err(e) => (e.status(), Json(ViewUpdateResponse::error(e.to_string()))),
        },
        other => (
            StatusCode::NOT_FOUND,
            Json(ViewUpdateResponse::error(format!(
                "unknown view update type '{other}'"
            ))),
        ),
    }
}

/// Peer broadcast: add a node to the local view. Idempotent.
pub async fn handle_add_node(
    Extension(view): Extension<Arc<ClusterView>>,
    Query(params): Query<NodeParams>,
) -> (StatusCode, Json<AckResponse>) {
    let pid = view.add_node(NodeAddr::new(params.ip_port)).await;
    tracing::debug!("add_node broadcast applied, partition {pid}");
    (StatusCode::OK, Json(AckResponse::success()))
}

/// Peer broadcast: drop a node from the local view. A node already missing
/// is a no-op, not an error.
pub async fn handle_remove_node(
    Extension(view): Extension<Arc<ClusterView>>,
    Query(params): Query<NodeParams>,
) -> (StatusCode, Json<AckResponse>) {
    view.remove_node(&NodeAddr::new(params.ip_port)).await;
    (StatusCode::OK, Json(AckResponse::success()))
}

/// Receives the full view pushed to a joining node.
pub async fn handle_accept_view(
    Extension(rebalancer): Extension<Arc<Rebalancer>>,
    Json(incoming): Json<BTreeMap<NodeAddr, u32>>,
) -> (StatusCode, Json<AckResponse>) {
    rebalancer.accept_view(incoming).await;
    (StatusCode::OK, Json(AckResponse::success()))
}

/// Tells a departing sole-replica node to drain its keys into the surviving
/// partitions. The coordinator blocks on this call.
pub async fn handle_send_data(
    Extension(rebalancer): Extension<Arc<Rebalancer>>,
    Query(params): Query<SendDataParams>,
) -> (StatusCode, Json<AckResponse>) {
    tracing::info!("draining keys before departure, requested by {}", params.ip_port);
    rebalancer.redistribute().await;
    (StatusCode::OK, Json(AckResponse::success()))
}
