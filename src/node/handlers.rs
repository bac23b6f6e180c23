use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use std::sync::Arc;

use super::NodeClient;
use super::memory::MemoryNode;
use super::protocol::{ENDPOINT_ENTRY, ENDPOINT_HEALTH, ErrorResponse, HealthResponse};
use crate::cluster::types::NodeId;

/// Routes of the node protocol. Expects `Extension<Arc<MemoryNode>>` and
/// `Extension<NodeId>` layers.
pub fn node_routes() -> Router {
    Router::new()
        .route(ENDPOINT_ENTRY, delete(handle_flush))
        .route(
            &format!("{}/:key", ENDPOINT_ENTRY),
            get(handle_get_entry)
                .put(handle_put_entry)
                .delete(handle_delete_entry),
        )
        .route(ENDPOINT_HEALTH, get(handle_health))
}

/// Node router with its store and id already attached.
pub fn node_router(store: Arc<MemoryNode>, node_id: NodeId) -> Router {
    node_routes()
        .layer(Extension(store))
        .layer(Extension(node_id))
}

pub async fn handle_get_entry(
    Extension(store): Extension<Arc<MemoryNode>>,
    Path(key): Path<String>,
) -> Response {
    match store.get_local(&key) {
        Some(value) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            value,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn handle_put_entry(
    Extension(store): Extension<Arc<MemoryNode>>,
    Path(key): Path<String>,
    body: Bytes,
) -> Response {
    match store.set(&key, &body).await {
        Ok(()) => {
            tracing::debug!("Stored {} ({} bytes)", key, body.len());
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn handle_delete_entry(
    Extension(store): Extension<Arc<MemoryNode>>,
    Path(key): Path<String>,
) -> Response {
    match store.delete(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn handle_flush(Extension(store): Extension<Arc<MemoryNode>>) -> Response {
    match store.delete("").await {
        Ok(()) => {
            tracing::info!("Flushed local store");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn handle_health(
    Extension(store): Extension<Arc<MemoryNode>>,
    Extension(node_id): Extension<NodeId>,
) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            node_id: node_id.to_string(),
            status: "ok".to_string(),
            entries: store.len(),
        }),
    )
}

pub(crate) fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
