use super::NodeClient;
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Entries written through this connector expire on the Redis side after a day.
const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

pub struct RedisNode {
    conn: ConnectionManager,
    endpoint: String,
}

impl RedisNode {
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let client = redis::Client::open(endpoint).map_err(|e| CacheError::Config(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        tracing::info!("Connected to redis node {}", endpoint);

        Ok(Self {
            conn,
            endpoint: endpoint.to_string(),
        })
    }

    fn redis_error(&self, err: redis::RedisError) -> CacheError {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            CacheError::Connection {
                endpoint: self.endpoint.clone(),
                message: err.to_string(),
            }
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

#[async_trait]
impl NodeClient for RedisNode {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(|e| self.redis_error(e))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, DEFAULT_TTL_SECS)
            .await
            .map_err(|e| self.redis_error(e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        if key.is_empty() {
            let _: () = redis::cmd("FLUSHDB")
                .query_async(&mut conn)
                .await
                .map_err(|e| self.redis_error(e))?;
        } else {
            let _: () = conn.del(key).await.map_err(|e| self.redis_error(e))?;
        }
        Ok(())
    }

    async fn health(&self) -> bool {
        let mut conn = self.conn.clone();
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
