use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a cached value, recorded so the facade can decode it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Binary,
    Structured,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Text => "text/plain",
            ContentType::Binary => "application/octet-stream",
            ContentType::Structured => "application/json",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Encoded size before compression.
    pub size: u64,
    pub compressed: bool,
    pub content_type: ContentType,
}

impl Metadata {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// A stored value with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub value: Vec<u8>,
    pub metadata: Metadata,
}

impl CacheEntry {
    pub fn new(value: Vec<u8>, metadata: Metadata) -> Self {
        Self { value, metadata }
    }

    pub fn is_expired(&self) -> bool {
        self.metadata.is_expired()
    }

    /// Envelope written to node stores.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
