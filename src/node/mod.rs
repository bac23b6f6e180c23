//! Per-Node Client Capability
//!
//! The minimal contract a single cache backend must satisfy. Routing and
//! replication only ever talk to [`NodeClient`], so new backends plug in
//! without touching either.
//!
//! ## Connectors
//! - **`memory`**: In-process map. Also the store a `cache-node` serves.
//! - **`http`**: Remote `cache-node` over the node HTTP protocol (`protocol`).
//! - **`redis`**: Redis instance (cargo feature `redis`).
//!
//! `handlers` is the server side of the HTTP protocol.

pub mod handlers;
pub mod http;
pub mod memory;
pub mod protocol;
#[cfg(feature = "redis")]
pub mod redis;


use crate::cluster::types::CacheOptions;
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub use http::HttpNode;
pub use memory::MemoryNode;

#[async_trait]
pub trait NodeClient: Send + Sync {
    /// `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// An empty key deletes everything on the node.
    async fn delete(&self, key: &str) -> Result<()>;

    async fn health(&self) -> bool;

    fn endpoint(&self) -> &str;
}

/// Builds a connector from an endpoint string.
///
/// `memory://...` gives a fresh in-process node, `redis://...` a Redis node
/// (feature `redis`), anything else an HTTP node.
pub async fn connect(endpoint: &str, options: &CacheOptions) -> Result<Arc<dyn NodeClient>> {
    if endpoint.starts_with("memory://") {
        return Ok(Arc::new(MemoryNode::with_endpoint(endpoint)));
    }

    if endpoint.starts_with("redis://") || endpoint.starts_with("rediss://") {
        #[cfg(feature = "redis")]
        {
            let node = redis::RedisNode::connect(endpoint).await?;
            return Ok(Arc::new(node));
        }
        #[cfg(not(feature = "redis"))]
        {
            return Err(CacheError::Config(format!(
                "{} requires the `redis` feature",
                endpoint
            )));
        }
    }

    let node = HttpNode::new(endpoint, options.timeout, options.retry_attempts)?;
    Ok(Arc::new(node))
}
