use crate::node::NodeClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    /// Random UUIDv4-based id, for nodes started without a configured one.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One physical cache backend.
///
/// `healthy` is the last known liveness, written only by the router (health
/// probes or an explicit `mark_health`). Everything else sees cloned
/// snapshots.
#[derive(Clone)]
pub struct CacheNode {
    pub id: NodeId,
    pub endpoint: String,
    /// Relative capacity. Informational only; hashing ignores it.
    pub weight: u32,
    pub healthy: bool,
    pub client: Arc<dyn NodeClient>,
}

impl CacheNode {
    pub fn new(id: impl Into<NodeId>, client: Arc<dyn NodeClient>) -> Self {
        Self {
            id: id.into(),
            endpoint: client.endpoint().to_string(),
            weight: 100,
            healthy: true,
            client,
        }
    }
}

impl fmt::Debug for CacheNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheNode")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("weight", &self.weight)
            .field("healthy", &self.healthy)
            .finish()
    }
}

/// Accepted for configuration compatibility. Writes always target every
/// replica regardless of the level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyLevel {
    One,
    Quorum,
    #[default]
    All,
}

pub const DEFAULT_REPLICATION_FACTOR: usize = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_VIRTUAL_NODES: usize = 100;
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Runtime options for a distributed cache.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub replication_factor: usize,
    /// Deadline for one logical operation, shared by all nodes it touches.
    pub timeout: Duration,
    /// Transport-level retries inside the HTTP connector only.
    pub retry_attempts: usize,
    pub consistency_level: ConsistencyLevel,
    pub virtual_nodes: usize,
    pub health_interval: Duration,
    pub health_timeout: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            replication_factor: DEFAULT_REPLICATION_FACTOR,
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: 3,
            consistency_level: ConsistencyLevel::All,
            virtual_nodes: DEFAULT_VIRTUAL_NODES,
            health_interval: DEFAULT_HEALTH_INTERVAL,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }
}

impl CacheOptions {
    /// Replaces zero values with defaults.
    pub fn normalized(mut self) -> Self {
        if self.replication_factor == 0 {
            self.replication_factor = DEFAULT_REPLICATION_FACTOR;
        }
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
        if self.virtual_nodes == 0 {
            self.virtual_nodes = DEFAULT_VIRTUAL_NODES;
        }
        if self.health_interval.is_zero() {
            self.health_interval = DEFAULT_HEALTH_INTERVAL;
        }
        if self.health_timeout.is_zero() {
            self.health_timeout = DEFAULT_HEALTH_TIMEOUT;
        }
        self
    }
}
