use crate::error::{CacheError, Result};
use crate::storage::ContentType;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A value as the facade sees it, before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Text(String),
    Binary(Vec<u8>),
    Structured(serde_json::Value),
}

impl CacheValue {
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(CacheValue::Structured(serde_json::to_value(value)?))
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            CacheValue::Text(_) => ContentType::Text,
            CacheValue::Binary(_) => ContentType::Binary,
            CacheValue::Structured(_) => ContentType::Structured,
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            CacheValue::Text(text) => Ok(text.into_bytes()),
            CacheValue::Binary(bytes) => Ok(bytes),
            CacheValue::Structured(value) => Ok(serde_json::to_vec(&value)?),
        }
    }

    pub fn decode(content_type: ContentType, bytes: Vec<u8>) -> Result<Self> {
        match content_type {
            ContentType::Text => String::from_utf8(bytes)
                .map(CacheValue::Text)
                .map_err(|e| CacheError::Codec(e.to_string())),
            ContentType::Binary => Ok(CacheValue::Binary(bytes)),
            ContentType::Structured => Ok(CacheValue::Structured(serde_json::from_slice(&bytes)?)),
        }
    }

    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            CacheValue::Structured(value) => Ok(serde_json::from_value(value)?),
            CacheValue::Text(text) => Ok(serde_json::from_str(&text)?),
            CacheValue::Binary(bytes) => Ok(serde_json::from_slice(&bytes)?),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CacheValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for CacheValue {
    fn from(text: String) -> Self {
        CacheValue::Text(text)
    }
}

impl From<&str> for CacheValue {
    fn from(text: &str) -> Self {
        CacheValue::Text(text.to_string())
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(bytes: Vec<u8>) -> Self {
        CacheValue::Binary(bytes)
    }
}

impl From<&[u8]> for CacheValue {
    fn from(bytes: &[u8]) -> Self {
        CacheValue::Binary(bytes.to_vec())
    }
}

impl From<serde_json::Value> for CacheValue {
    fn from(value: serde_json::Value) -> Self {
        CacheValue::Structured(value)
    }
}
