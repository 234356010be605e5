use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;

use super::daemon::{AntiEntropy, Snapshot, SyncResponse};

/// Receives an anti-entropy push: the pushing node's entire key table.
pub async fn handle_sync(
    Extension(daemon): Extension<Arc<AntiEntropy>>,
    Json(snapshot): Json<Snapshot>,
) -> (StatusCode, Json<SyncResponse>) {
    let adopted = daemon.apply_snapshot(snapshot);
    (
        StatusCode::OK,
        Json(SyncResponse {
            msg: "success".to_string(),
            adopted,
        }),
    )
}
