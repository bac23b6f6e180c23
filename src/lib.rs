//! Replicated Cache Library
//!
//! A consistent-hash-routed cache layer over independent per-node stores,
//! with best-effort replication and health-aware routing. The `cache-node`
//! binary (`main.rs`) serves one node and a gateway on top of this crate.
//!
//! ## Architecture Modules
//! - **`cache`**: The facade consumers use. Validates keys, encodes values,
//!   builds metadata, compresses, counts hits and misses.
//! - **`storage`**: Providers behind the facade (memory, single remote node,
//!   distributed), including lazy TTL expiry.
//! - **`cluster`**: Hash ring, node registry, health monitor and the
//!   replication coordinator (`DistributedCache`).
//! - **`node`**: The per-node client contract and its connectors (in-process,
//!   HTTP, Redis), plus the server side of the node protocol.
//! - **`config`** / **`error`**: Layered configuration and the error taxonomy.
//!
//! Replication is eventually consistent: partial write failures are
//! reported but never rolled back.

pub mod cache;
pub mod cluster;
pub mod config;
pub mod error;
pub mod node;
pub mod storage;

pub use cache::{CacheStrategy, CacheValue};
pub use cluster::{CacheNode, CacheOptions, DistributedCache, NodeId};
pub use error::{CacheError, Result};
