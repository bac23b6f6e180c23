use super::ring::HashRing;
use super::types::{CacheNode, NodeId};
use parking_lot::RwLock;
use std::collections::HashSet;

struct RouterState {
    nodes: Vec<CacheNode>,
    ring: HashRing,
}

/// Node registry plus consistent-hash routing.
///
/// The node list and the ring share one lock, so a resolution never sees a
/// list that does not match its ring. No caller holds the lock across I/O.
pub struct ConsistentHashRouter {
    state: RwLock<RouterState>,
    virtual_nodes: usize,
    replication_factor: usize,
}

impl ConsistentHashRouter {
    pub fn new(virtual_nodes: usize, replication_factor: usize) -> Self {
        Self {
            state: RwLock::new(RouterState {
                nodes: Vec::new(),
                ring: HashRing::default(),
            }),
            virtual_nodes: virtual_nodes.max(1),
            replication_factor: replication_factor.max(1),
        }
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    /// Replaces the whole node set and rebuilds the ring under one write lock.
    pub fn update_nodes(&self, nodes: Vec<CacheNode>) {
        let ids: Vec<NodeId> = nodes.iter().map(|node| node.id.clone()).collect();
        let ring = HashRing::build(&ids, self.virtual_nodes);

        let mut state = self.state.write();
        state.nodes = nodes;
        state.ring = ring;

        tracing::info!(
            "Node set updated: {} nodes, {} virtual points",
            state.nodes.len(),
            state.ring.len()
        );
    }

    /// Node owning `key` on the ring, healthy or not. `None` when no nodes
    /// are configured.
    pub fn select_node(&self, key: &str) -> Option<CacheNode> {
        let state = self.state.read();
        let idx = state.ring.owner_of(key)?;
        state.nodes.get(idx).cloned()
    }

    /// Up to `replication_factor` distinct healthy nodes, starting at the
    /// key's primary and walking the physical node list.
    pub fn get_replication_nodes(&self, key: &str) -> Vec<CacheNode> {
        let state = self.state.read();
        let Some(primary) = state.ring.owner_of(key) else {
            return Vec::new();
        };

        let total = state.nodes.len();
        let mut replicas = Vec::with_capacity(self.replication_factor.min(total));
        let mut seen = HashSet::new();

        for offset in 0..total {
            if replicas.len() == self.replication_factor {
                break;
            }
            let node = &state.nodes[(primary + offset) % total];
            if node.healthy && seen.insert(node.id.clone()) {
                replicas.push(node.clone());
            }
        }

        tracing::debug!("Key {} -> {} replica(s)", key, replicas.len());
        replicas
    }

    /// Sets one node's health flag. Returns `false` for unknown ids.
    pub fn mark_health(&self, id: &NodeId, healthy: bool) -> bool {
        let mut state = self.state.write();
        let mut found = false;
        for node in state.nodes.iter_mut().filter(|node| &node.id == id) {
            node.healthy = healthy;
            found = true;
        }
        found
    }

    pub fn nodes(&self) -> Vec<CacheNode> {
        self.state.read().nodes.clone()
    }

    pub fn healthy_nodes(&self) -> Vec<CacheNode> {
        self.state
            .read()
            .nodes
            .iter()
            .filter(|node| node.healthy)
            .cloned()
            .collect()
    }

    pub fn healthy_count(&self) -> usize {
        self.state.read().nodes.iter().filter(|node| node.healthy).count()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn ring_len(&self) -> usize {
        self.state.read().ring.len()
    }
}
