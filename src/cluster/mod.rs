//! Cluster Module
//!
//! Routing and replication across many cache nodes.
//!
//! ## Core Concepts
//! - **Ring**: Every node contributes virtual points to a 32-bit FNV-1a hash
//!   ring; a key belongs to the first point at or after its hash.
//! - **Registry**: `ConsistentHashRouter` owns the node list, its health
//!   flags and the ring behind one reader/writer lock.
//! - **Health**: `HealthMonitor` probes nodes on an interval and flips their
//!   flags. Unhealthy nodes keep their ring space but are skipped when
//!   picking replicas.
//! - **Replication**: `DistributedCache` reads from the primary and fans
//!   writes out to the replica set, best effort and without rollback.

pub mod coordinator;
pub mod health;
pub mod ring;
pub mod router;
pub mod types;


pub use coordinator::DistributedCache;
pub use health::{HealthMonitor, HealthReport};
pub use router::ConsistentHashRouter;
pub use types::{CacheNode, CacheOptions, ConsistencyLevel, NodeId};
