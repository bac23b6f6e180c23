use super::NodeClient;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-process node store.
pub struct MemoryNode {
    data: DashMap<String, Vec<u8>>,
    endpoint: String,
}

impl MemoryNode {
    pub fn new() -> Self {
        Self::with_endpoint("memory://local")
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            data: DashMap::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn get_local(&self, key: &str) -> Option<Vec<u8>> {
        self.data.get(key).map(|value| value.clone())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemoryNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeClient for MemoryNode {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get_local(key))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.data.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            self.data.clear();
        } else {
            self.data.remove(key);
        }
        Ok(())
    }

    async fn health(&self) -> bool {
        true
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
