//! Cache Error Taxonomy
//!
//! Every logical cache operation returns a single [`CacheError`]. Per-node
//! detail from fan-out operations is kept inside [`CacheError::Replication`]
//! so the message names each failing node.

use crate::cluster::types::NodeId;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Maximum key length accepted by the facade, in bytes.
pub const MAX_KEY_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache key cannot be empty")]
    EmptyKey,

    #[error("cache key too long: {len} bytes (max {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("value exceeds max size: size {size} exceeds limit {limit}")]
    ValueTooLarge { size: u64, limit: u64 },

    #[error("no healthy node available")]
    NoHealthyNode,

    #[error("node unavailable: {0}")]
    NodeUnavailable(NodeId),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    #[error("codec error: {0}")]
    Codec(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error(
        "{operation} failed on {}/{attempted} nodes: {}",
        .failures.len(),
        FailureList(.failures)
    )]
    Replication {
        operation: &'static str,
        attempted: usize,
        failures: Vec<NodeFailure>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Rejected before any I/O; never worth retrying.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CacheError::EmptyKey | CacheError::KeyTooLong { .. } | CacheError::ValueTooLarge { .. }
        )
    }

    pub fn is_routing(&self) -> bool {
        matches!(self, CacheError::NoHealthyNode | CacheError::NodeUnavailable(_))
    }

    /// Node ids that failed inside a fan-out. Empty for every other variant.
    pub fn failed_nodes(&self) -> Vec<&NodeId> {
        match self {
            CacheError::Replication { failures, .. } => failures.iter().map(|f| &f.node).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        CacheError::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Codec(err.to_string())
    }
}

impl From<config::ConfigError> for CacheError {
    fn from(err: config::ConfigError) -> Self {
        CacheError::Config(err.to_string())
    }
}

/// One node's share of a failed fan-out.
#[derive(Debug, Clone)]
pub struct NodeFailure {
    pub node: NodeId,
    pub reason: String,
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.node, self.reason)
    }
}

struct FailureList<'a>(&'a [NodeFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

/// Rejects empty keys and keys longer than [`MAX_KEY_LEN`] bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::EmptyKey);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(CacheError::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_LEN,
        });
    }
    Ok(())
}
