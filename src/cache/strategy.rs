use super::compression;
use super::metrics::{CacheMetrics, MetricsSnapshot};
use super::value::CacheValue;
use crate::cluster::types::{CacheNode, CacheOptions};
use crate::cluster::DistributedCache;
use crate::config::{AppConfig, CacheConfig};
use crate::error::{CacheError, Result, validate_key};
use crate::node;
use crate::storage::memory::DEFAULT_JANITOR_INTERVAL;
use crate::storage::{
    CacheEntry, CacheProvider, ContentType, DistributedProvider, Lookup, MemoryCache, Metadata,
    RemoteCache,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Which provider backs the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Memory,
    Remote,
    Distributed,
}

impl Strategy {
    /// Unknown names fall back to `Memory`; the cache is never on the
    /// critical path.
    pub fn from_config(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "memory" => Strategy::Memory,
            "remote" | "redis" => Strategy::Remote,
            "distributed" => Strategy::Distributed,
            other => {
                tracing::warn!("Unknown cache strategy '{}', using memory", other);
                Strategy::Memory
            }
        }
    }
}

/// Facade-level settings.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub max_size: u64,
    pub compression: bool,
    pub compression_threshold: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        let ttl = if config.ttl_secs == 0 {
            Duration::from_secs(24 * 60 * 60)
        } else {
            config.ttl()
        };

        Self {
            ttl,
            max_size: config.max_size,
            compression: config.compression,
            compression_threshold: config.compression_threshold,
        }
    }
}

/// The entry point for cache consumers.
///
/// Validates keys, encodes values and builds their metadata, compresses
/// large payloads and keeps hit/miss counters. Storage is delegated to
/// whichever [`CacheProvider`] was selected.
pub struct CacheStrategy {
    provider: Arc<dyn CacheProvider>,
    settings: CacheSettings,
    metrics: CacheMetrics,
    distributed: Option<Arc<DistributedCache>>,
}

impl CacheStrategy {
    pub fn with_provider(provider: Arc<dyn CacheProvider>, settings: CacheSettings) -> Self {
        Self {
            provider,
            settings,
            metrics: CacheMetrics::new(),
            distributed: None,
        }
    }

    pub fn with_distributed(cache: Arc<DistributedCache>, settings: CacheSettings) -> Self {
        let provider = Arc::new(DistributedProvider::new(cache.clone()));
        Self {
            distributed: Some(cache),
            ..Self::with_provider(provider, settings)
        }
    }

    /// Builds the provider named by `cache.strategy`.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let settings = CacheSettings::from(&config.cache);
        let options = CacheOptions::from(&config.cluster);

        let strategy = match Strategy::from_config(&config.cache.strategy) {
            Strategy::Memory => {
                let cache = MemoryCache::new();
                cache.start_janitor(DEFAULT_JANITOR_INTERVAL);
                Self::with_provider(cache, settings)
            }
            Strategy::Remote => {
                let endpoint = config.cache.distribution.first().ok_or_else(|| {
                    CacheError::Config("remote strategy needs one endpoint in cache.distribution".to_string())
                })?;
                let (_, endpoint) = split_endpoint(endpoint);
                let client = node::connect(endpoint, &options).await?;
                Self::with_provider(Arc::new(RemoteCache::new(client)), settings)
            }
            Strategy::Distributed => {
                if config.cache.distribution.is_empty() {
                    return Err(CacheError::Config(
                        "distributed strategy needs endpoints in cache.distribution".to_string(),
                    ));
                }

                let mut nodes = Vec::with_capacity(config.cache.distribution.len());
                for entry in &config.cache.distribution {
                    let (id, endpoint) = split_endpoint(entry);
                    let client = node::connect(endpoint, &options).await?;
                    nodes.push(CacheNode::new(id, client));
                }

                Self::with_distributed(DistributedCache::new(nodes, options), settings)
            }
        };

        tracing::info!("Cache facade using {} provider", strategy.provider.name());
        Ok(strategy)
    }

    pub async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        validate_key(key)?;

        let lookup = match self.provider.retrieve(key).await {
            Ok(lookup) => lookup,
            Err(e) => {
                self.metrics.record_miss();
                return Err(e);
            }
        };

        match lookup {
            Lookup::Hit(entry) => match Self::decode_entry(entry) {
                Ok(value) => {
                    self.metrics.record_hit();
                    Ok(Some(value))
                }
                Err(e) => {
                    self.metrics.record_miss();
                    Err(e)
                }
            },
            Lookup::Miss => {
                self.metrics.record_miss();
                Ok(None)
            }
            Lookup::Expired => {
                self.metrics.record_miss();
                self.metrics.record_eviction();
                Ok(None)
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(value.into_json()?)),
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, value: impl Into<CacheValue>) -> Result<()> {
        self.set_with_ttl(key, value, self.settings.ttl).await
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, CacheValue::json(value)?).await
    }

    pub async fn set_with_ttl(&self, key: &str, value: impl Into<CacheValue>, ttl: Duration) -> Result<()> {
        validate_key(key)?;

        let value = value.into();
        let content_type = value.content_type();
        let encoded = value.into_bytes()?;
        let size = encoded.len() as u64;

        if self.settings.max_size > 0 && size > self.settings.max_size {
            return Err(CacheError::ValueTooLarge {
                size,
                limit: self.settings.max_size,
            });
        }

        let metadata = self.generate_metadata(size, content_type, ttl);
        let payload = if metadata.compressed {
            compression::compress(&encoded)?
        } else {
            encoded
        };

        self.provider
            .store(key, CacheEntry::new(payload, metadata))
            .await?;
        self.metrics.record_write(size);
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.provider.delete(key).await?;
        self.metrics.touch();
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.provider.clear().await?;
        self.metrics.reset_size();
        Ok(())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// The coordinator behind a distributed facade.
    pub fn distributed(&self) -> Option<&Arc<DistributedCache>> {
        self.distributed.as_ref()
    }

    fn decode_entry(CacheEntry { value, metadata }: CacheEntry) -> Result<CacheValue> {
        let bytes = if metadata.compressed {
            compression::decompress(&value)?
        } else {
            value
        };
        CacheValue::decode(metadata.content_type, bytes)
    }

    fn generate_metadata(&self, size: u64, content_type: ContentType, ttl: Duration) -> Metadata {
        let created_at = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Metadata {
            created_at,
            expires_at,
            size,
            compressed: self.settings.compression
                && size > self.settings.compression_threshold as u64,
            content_type,
        }
    }
}

/// Splits `id=endpoint`; a bare endpoint doubles as its own id.
pub fn split_endpoint(entry: &str) -> (&str, &str) {
    match entry.split_once('=') {
        Some((id, endpoint)) if !id.is_empty() && !id.contains("://") && !endpoint.is_empty() => {
            (id.trim(), endpoint.trim())
        }
        _ => (entry.trim(), entry.trim()),
    }
}
