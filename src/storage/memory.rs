use super::entry::CacheEntry;
use super::{CacheProvider, Lookup};
use crate::error::Result;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

pub const DEFAULT_JANITOR_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// In-process provider.
pub struct MemoryCache {
    data: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            data: Arc::new(DashMap::new()),
        })
    }

    /// Sweeps expired entries every `every`. The task ends once the cache
    /// is dropped.
    pub fn start_janitor(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    tracing::debug!("Janitor purged {} expired entries", purged);
                }
            }
        })
    }

    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.data.len();
        self.data
            .retain(|_, entry| !entry.metadata.is_expired_at(now));
        before.saturating_sub(self.data.len())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl CacheProvider for MemoryCache {
    async fn store(&self, key: &str, entry: CacheEntry) -> Result<()> {
        self.data.insert(key.to_string(), entry);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Lookup> {
        let entry = match self.data.get(key) {
            Some(entry) => entry.clone(),
            None => return Ok(Lookup::Miss),
        };

        if !entry.is_expired() {
            return Ok(Lookup::Hit(entry));
        }

        let data = self.data.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            // A fresh write may have replaced the entry since the read.
            data.remove_if(&key, |_, entry| entry.is_expired());
        });

        Ok(Lookup::Expired)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.data.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
