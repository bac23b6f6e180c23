//! Storage Providers
//!
//! The layer the cache facade stores entries through.
//!
//! ## Providers
//! - **`MemoryCache`**: Entries in a local `DashMap`, with lazy expiry on
//!   read and a periodic janitor sweep.
//! - **`RemoteCache`**: One remote node (`NodeClient`), entries kept as
//!   bincode envelopes so expiry survives the round trip.
//! - **`DistributedProvider`**: Same envelope, routed and replicated by
//!   `DistributedCache`.
//!
//! Expired entries found on read are purged by a detached task that only
//! removes the key if it is still expired, so a rewrite landing after the
//! read survives. A failing purge never changes the read's result.

pub mod distributed;
pub mod entry;
pub mod memory;
pub mod remote;


use crate::error::Result;
use async_trait::async_trait;

pub use distributed::DistributedProvider;
pub use entry::{CacheEntry, ContentType, Metadata};
pub use memory::MemoryCache;
pub use remote::RemoteCache;

/// Result of a provider read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(CacheEntry),
    Miss,
    /// Present but past `expires_at`; a purge has been dispatched.
    Expired,
}

#[async_trait]
pub trait CacheProvider: Send + Sync {
    async fn store(&self, key: &str, entry: CacheEntry) -> Result<()>;

    async fn retrieve(&self, key: &str) -> Result<Lookup>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Decodes a node envelope into a lookup, spawning `purge` when the entry
/// has expired.
pub(crate) fn lookup_envelope<F, Fut>(key: &str, raw: Option<Vec<u8>>, purge: F) -> Result<Lookup>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<()>> + Send + 'static,
{
    let Some(raw) = raw else {
        return Ok(Lookup::Miss);
    };

    let entry = CacheEntry::decode(&raw)?;
    if !entry.is_expired() {
        return Ok(Lookup::Hit(entry));
    }

    let key = key.to_string();
    let purge = purge();
    tokio::spawn(async move {
        if let Err(e) = purge.await {
            tracing::debug!("Purge of expired key {} failed: {}", key, e);
        }
    });

    Ok(Lookup::Expired)
}

/// True when `raw` is an envelope still past its expiry. Missing or
/// undecodable values are left alone.
pub(crate) fn still_expired(raw: Option<&[u8]>) -> bool {
    raw.and_then(|raw| CacheEntry::decode(raw).ok())
        .is_some_and(|entry| entry.is_expired())
}
