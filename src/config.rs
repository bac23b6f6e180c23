//! Configuration
//!
//! Layered with the `config` crate: an optional TOML file, then environment
//! overrides prefixed `RCACHE` with `__` as the section separator, e.g.
//! `RCACHE__CLUSTER__REPLICATION_FACTOR=3`.

use crate::cluster::types::{CacheOptions, ConsistencyLevel};
use crate::error::{CacheError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "cache.toml";
pub const ENV_PREFIX: &str = "RCACHE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// `memory`, `remote` or `distributed`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Largest accepted encoded value in bytes. 0 disables the check.
    #[serde(default)]
    pub max_size: u64,
    #[serde(default)]
    pub compression: bool,
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: usize,
    /// Backend endpoints, optionally as `id=endpoint`.
    #[serde(default)]
    pub distribution: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "default_replication_factor")]
    pub replication_factor: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
    #[serde(default)]
    pub consistency_level: ConsistencyLevel,
    #[serde(default = "default_virtual_nodes")]
    pub virtual_nodes: usize,
    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default)]
    pub node_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_strategy() -> String {
    "memory".to_string()
}

fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_compression_threshold() -> usize {
    1024
}

fn default_replication_factor() -> usize {
    2
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_retry_attempts() -> usize {
    3
}

fn default_virtual_nodes() -> usize {
    100
}

fn default_health_interval_secs() -> u64 {
    30
}

fn default_health_timeout_ms() -> u64 {
    2_000
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7000))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            ttl_secs: default_ttl_secs(),
            max_size: 0,
            compression: false,
            compression_threshold: default_compression_threshold(),
            distribution: Vec::new(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            replication_factor: default_replication_factor(),
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            consistency_level: ConsistencyLevel::default(),
            virtual_nodes: default_virtual_nodes(),
            health_interval_secs: default_health_interval_secs(),
            health_timeout_ms: default_health_timeout_ms(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            node_id: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads `path` (or `cache.toml` when present) and applies environment
    /// overrides. A missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Same as [`AppConfig::load`] with overrides read from `<prefix>__*`.
    pub fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(CacheError::Config(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                builder = builder.add_source(File::from(p));
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cache.distribution"),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cluster.replication_factor == 0 {
            return Err(CacheError::Config(
                "cluster.replication_factor must be at least 1".to_string(),
            ));
        }
        if self.cluster.timeout_ms == 0 {
            return Err(CacheError::Config(
                "cluster.timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.cluster.virtual_nodes == 0 {
            return Err(CacheError::Config(
                "cluster.virtual_nodes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl From<&ClusterConfig> for CacheOptions {
    fn from(config: &ClusterConfig) -> Self {
        CacheOptions {
            replication_factor: config.replication_factor,
            timeout: Duration::from_millis(config.timeout_ms),
            retry_attempts: config.retry_attempts,
            consistency_level: config.consistency_level,
            virtual_nodes: config.virtual_nodes,
            health_interval: Duration::from_secs(config.health_interval_secs),
            health_timeout: Duration::from_millis(config.health_timeout_ms),
        }
        .normalized()
    }
}
