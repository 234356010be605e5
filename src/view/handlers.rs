use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::protocol::{
    PartitionIdListResponse, PartitionIdResponse, PartitionMembersResponse, PartitionQuery,
    ViewDumpResponse,
};
use super::table::ClusterView;

pub async fn handle_partition_members(
    Extension(view): Extension<Arc<ClusterView>>,
    Query(query): Query<PartitionQuery>,
) -> (StatusCode, Json<PartitionMembersResponse>) {
    let members = view.members_of(query.partition_id).await;
    (
        StatusCode::OK,
        Json(PartitionMembersResponse {
            msg: "success".to_string(),
            partition_members: members,
        }),
    )
}

pub async fn handle_partition_id(
    Extension(view): Extension<Arc<ClusterView>>,
) -> (StatusCode, Json<PartitionIdResponse>) {
    match view.local_partition().await {
        Some(partition_id) => (
            StatusCode::OK,
            Json(PartitionIdResponse {
                msg: "success".to_string(),
                partition_id: Some(partition_id),
                error: None,
            }),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(PartitionIdResponse {
                msg: "error".to_string(),
                partition_id: None,
                error: Some("node is not part of the view".to_string()),
            }),
        ),
    }
}

pub async fn handle_all_partition_ids(
    Extension(view): Extension<Arc<ClusterView>>,
) -> (StatusCode, Json<PartitionIdListResponse>) {
    (
        StatusCode::OK,
        Json(PartitionIdListResponse {
            msg: "success".to_string(),
            partition_id_list: view.partition_ids().await,
        }),
    )
}

pub async fn handle_print_view(
    Extension(view): Extension<Arc<ClusterView>>,
) -> (StatusCode, Json<ViewDumpResponse>) {
    (
        StatusCode::OK,
        Json(ViewDumpResponse {
            current_view: view.snapshot().await,
        }),
    )
}
