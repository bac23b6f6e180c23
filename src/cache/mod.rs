//! Cache Facade
//!
//! What consumers call, independent of the provider behind it.
//!
//! - **`strategy`**: `CacheStrategy` (validation, metadata, compression,
//!   metrics) and provider selection from configuration.
//! - **`value`**: `CacheValue`, the serialization boundary. Everything below
//!   the facade only sees bytes.
//! - **`compression`**: gzip for payloads above the size threshold.
//! - **`metrics`**: atomic hit/miss/eviction counters.
//! - **`handlers`**: HTTP gateway exposing the facade.

pub mod compression;
pub mod handlers;
pub mod metrics;
pub mod strategy;
pub mod value;

#[cfg(test)]
mod tests;

pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use strategy::{CacheSettings, CacheStrategy, Strategy};
pub use value::CacheValue;
