use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use std::sync::Arc;

use super::strategy::CacheStrategy;
use super::value::CacheValue;
use crate::error::CacheError;
use crate::node::handlers::error_response;
use crate::node::protocol::{ENDPOINT_CACHE, ENDPOINT_METRICS};

/// Public cache API. Expects an `Extension<Arc<CacheStrategy>>` layer.
pub fn gateway_routes() -> Router {
    Router::new()
        .route(ENDPOINT_CACHE, delete(handle_clear))
        .route(
            &format!("{}/:key", ENDPOINT_CACHE),
            get(handle_get).put(handle_put).delete(handle_delete),
        )
        .route(ENDPOINT_METRICS, get(handle_metrics))
}

pub async fn handle_get(
    Extension(cache): Extension<Arc<CacheStrategy>>,
    Path(key): Path<String>,
) -> Response {
    match cache.get(&key).await {
        Ok(Some(value)) => {
            let mime = value.content_type().mime();
            match value.into_bytes() {
                Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, mime)], body).into_response(),
                Err(e) => cache_error_response(e),
            }
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => cache_error_response(e),
    }
}

pub async fn handle_put(
    Extension(cache): Extension<Arc<CacheStrategy>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let value = match value_from_request(&headers, &body) {
        Ok(value) => value,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match cache.set(&key, value).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => cache_error_response(e),
    }
}

pub async fn handle_delete(
    Extension(cache): Extension<Arc<CacheStrategy>>,
    Path(key): Path<String>,
) -> Response {
    match cache.delete(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => cache_error_response(e),
    }
}

pub async fn handle_clear(Extension(cache): Extension<Arc<CacheStrategy>>) -> Response {
    match cache.clear().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => cache_error_response(e),
    }
}

pub async fn handle_metrics(Extension(cache): Extension<Arc<CacheStrategy>>) -> Response {
    Json(cache.metrics()).into_response()
}

/// `text/*` bodies become text, `application/json` structured, anything
/// else binary.
pub fn value_from_request(headers: &HeaderMap, body: &[u8]) -> Result<CacheValue, CacheError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream");

    if content_type.starts_with("text/") {
        String::from_utf8(body.to_vec())
            .map(CacheValue::Text)
            .map_err(|e| CacheError::Codec(e.to_string()))
    } else if content_type.starts_with("application/json") {
        Ok(CacheValue::Structured(serde_json::from_slice(body)?))
    } else {
        Ok(CacheValue::Binary(body.to_vec()))
    }
}

fn cache_error_response(err: CacheError) -> Response {
    let status = match &err {
        CacheError::ValueTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        e if e.is_routing() => StatusCode::SERVICE_UNAVAILABLE,
        CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    };

    if status.is_server_error() {
        tracing::error!("Cache request failed: {}", err);
    }

    error_response(status, err.to_string())
}
