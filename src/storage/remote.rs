use super::entry::CacheEntry;
use super::{CacheProvider, Lookup, lookup_envelope, still_expired};
use crate::error::{CacheError, Result};
use crate::node::NodeClient;

use async_trait::async_trait;
use std::sync::Arc;

/// Provider backed by a single remote node.
pub struct RemoteCache {
    client: Arc<dyn NodeClient>,
}

impl RemoteCache {
    pub fn new(client: Arc<dyn NodeClient>) -> Self {
        tracing::info!("Remote cache provider using {}", client.endpoint());
        Self { client }
    }
}

#[async_trait]
impl CacheProvider for RemoteCache {
    async fn store(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let envelope = entry.encode()?;
        self.client.set(key, &envelope).await
    }

    async fn retrieve(&self, key: &str) -> Result<Lookup> {
        let raw = self.client.get(key).await?;

        lookup_envelope(key, raw, || {
            let client = self.client.clone();
            let key = key.to_string();
            async move {
                let current = client.get(&key).await?;
                if still_expired(current.as_deref()) {
                    client.delete(&key).await?;
                }
                Ok::<(), CacheError>(())
            }
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client.delete(key).await
    }

    async fn clear(&self) -> Result<()> {
        self.client.delete("").await
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
