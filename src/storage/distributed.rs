use super::entry::CacheEntry;
use super::{CacheProvider, Lookup, lookup_envelope, still_expired};
use crate::cluster::DistributedCache;
use crate::error::{CacheError, Result};

use async_trait::async_trait;
use std::sync::Arc;

/// Provider routing entries through a [`DistributedCache`].
pub struct DistributedProvider {
    cache: Arc<DistributedCache>,
}

impl DistributedProvider {
    pub fn new(cache: Arc<DistributedCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<DistributedCache> {
        &self.cache
    }
}

#[async_trait]
impl CacheProvider for DistributedProvider {
    async fn store(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let envelope = entry.encode()?;
        self.cache.set(key, envelope).await
    }

    async fn retrieve(&self, key: &str) -> Result<Lookup> {
        let raw = self.cache.get(key).await?;

        lookup_envelope(key, raw, || {
            let cache = self.cache.clone();
            let key = key.to_string();
            async move {
                let current = cache.get(&key).await?;
                if still_expired(current.as_deref()) {
                    cache.delete(&key).await?;
                }
                Ok::<(), CacheError>(())
            }
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.delete(key).await
    }

    async fn clear(&self) -> Result<()> {
        self.cache.clear().await
    }

    fn name(&self) -> &'static str {
        "distributed"
    }
}
