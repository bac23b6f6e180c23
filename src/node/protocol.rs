//! Node Network Protocol
//!
//! Endpoints and DTOs for talking to a single `cache-node` over HTTP.
//!
//! Values travel as raw bytes (`application/octet-stream`); only the health
//! and error responses are JSON.

use serde::{Deserialize, Serialize};

// --- Node endpoints ---

/// Single entry: `GET`, `PUT` and `DELETE` on `/internal/entry/{key}`.
/// `DELETE` on the bare path flushes the node.
pub const ENDPOINT_ENTRY: &str = "/internal/entry";
/// Liveness probe.
pub const ENDPOINT_HEALTH: &str = "/health";

// --- Gateway endpoints ---

/// Public cache API backed by the configured provider.
pub const ENDPOINT_CACHE: &str = "/cache";
/// Metrics snapshot of the gateway facade.
pub const ENDPOINT_METRICS: &str = "/metrics";

/// Response to a health probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub node_id: String,
    pub status: String,
    /// Number of keys held by the node's local store.
    pub entries: usize,
}

/// Body returned with any non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
