use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::protocol::{KeyCountResponse, KvParams, KvResponse, TotalKeyCountResponse};
use super::service::KvRouter;
use crate::error::KvError;

fn error_reply(err: &KvError) -> (StatusCode, Json<KvResponse>) {
    (err.status(), Json(KvResponse::error(err.to_string())))
}

pub async fn handle_kv_read(
    Extension(router): Extension<Arc<KvRouter>>,
    Query(params): Query<KvParams>,
) -> (StatusCode, Json<KvResponse>) {
    let Some(key) = params.key else {
        return error_reply(&KvError::InvalidKey);
    };
    match router.read(&key, params.causal_payload.as_deref()).await {
        Ok(reply) => (StatusCode::OK, Json(reply.body)),
        Err(e) => error_reply(&e),
    }
}

pub async fn handle_kv_write(
    Extension(router): Extension<Arc<KvRouter>>,
    Query(params): Query<KvParams>,
) -> (StatusCode, Json<KvResponse>) {
    let Some(key) = params.key else {
        return error_reply(&KvError::InvalidKey);
    };
    let Some(value) = params.value else {
        return error_reply(&KvError::NoValuePresent);
    };
    match router
        .write(&key, &value, params.causal_payload.as_deref())
        .await
    {
        Ok(reply) => {
            let status = if reply.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(reply.body))
        }
        Err(e) => error_reply(&e),
    }
}

/// Internal point query used by ownership probes; never fans out.
pub async fn handle_get_key(
    Extension(router): Extension<Arc<KvRouter>>,
    Query(params): Query<KvParams>,
) -> (StatusCode, Json<KvResponse>) {
    let Some(key) = params.key else {
        return error_reply(&KvError::InvalidKey);
    };
    match router.read_local(&key).await {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => error_reply(&e),
    }
}

/// Internal placement/migration write; materializes the key locally.
pub async fn handle_add_key(
    Extension(router): Extension<Arc<KvRouter>>,
    Query(params): Query<KvParams>,
) -> (StatusCode, Json<KvResponse>) {
    let Some(key) = params.key else {
        return error_reply(&KvError::InvalidKey);
    };
    let Some(value) = params.value else {
        return error_reply(&KvError::NoValuePresent);
    };
    match router
        .add_key(&key, &value, params.causal_payload.as_deref())
        .await
    {
        Ok(reply) => {
            let status = if reply.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(reply.body))
        }
        Err(e) => error_reply(&e),
    }
}

/// Internal migration deletion; keeps sibling replicas in step after a key
/// has been moved elsewhere.
pub async fn handle_remove_key(
    Extension(router): Extension<Arc<KvRouter>>,
    Query(params): Query<KvParams>,
) -> (StatusCode, Json<KvResponse>) {
    let Some(key) = params.key else {
        return error_reply(&KvError::InvalidKey);
    };
    match router.remove_local(&key) {
        Ok(()) => (StatusCode::OK, Json(KvResponse::success())),
        Err(e) => error_reply(&e),
    }
}

pub async fn handle_key_count(
    Extension(router): Extension<Arc<KvRouter>>,
) -> (StatusCode, Json<KeyCountResponse>) {
    (
        StatusCode::OK,
        Json(KeyCountResponse {
            count: router.key_count(),
        }),
    )
}

pub async fn handle_total_key_count(
    Extension(router): Extension<Arc<KvRouter>>,
) -> (StatusCode, Json<TotalKeyCountResponse>) {
    (
        StatusCode::OK,
        Json(TotalKeyCountResponse {
            total: router.total_key_count().await,
        }),
    )
}
