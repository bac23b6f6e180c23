//! Hash Ring
//!
//! Virtual points for every physical node, sorted by hash. A key belongs to
//! the first point whose hash is `>=` the key's hash, wrapping to the first
//! point past the end of the ring.

use super::types::NodeId;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a.
pub fn hash_key(key: &[u8]) -> u32 {
    key.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualPoint {
    pub hash: u32,
    /// Index into the node list the ring was built from.
    pub node: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HashRing {
    points: Vec<VirtualPoint>,
}

impl HashRing {
    pub fn build(node_ids: &[NodeId], virtual_nodes: usize) -> Self {
        let mut points = Vec::with_capacity(node_ids.len() * virtual_nodes);

        for (node, id) in node_ids.iter().enumerate() {
            for i in 0..virtual_nodes {
                let hash = hash_key(format!("{}-{}", id, i).as_bytes());
                points.push(VirtualPoint { hash, node });
            }
        }

        points.sort_unstable_by_key(|point| (point.hash, point.node));

        Self { points }
    }

    /// Node index owning `hash`, or `None` for an empty ring.
    pub fn owner(&self, hash: u32) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }

        let idx = self.points.partition_point(|point| point.hash < hash);
        let idx = if idx == self.points.len() { 0 } else { idx };

        Some(self.points[idx].node)
    }

    pub fn owner_of(&self, key: &str) -> Option<usize> {
        self.owner(hash_key(key.as_bytes()))
    }

    pub fn points(&self) -> &[VirtualPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(n: usize) -> Vec<NodeId> {
        (0..n).map(|i| NodeId(format!("node-{}", i))).collect()
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(hash_key(b""), 0x811c9dc5);
        assert_eq!(hash_key(b"a"), 0xe40c292c);
        assert_eq!(hash_key(b"foobar"), 0xbf9cf968);
    }

    #[test]
    fn test_ring_is_sorted_and_sized() {
        let ring = HashRing::build(&ids(4), 100);

        assert_eq!(ring.len(), 400);
        assert!(ring.points().windows(2).all(|w| w[0].hash <= w[1].hash));
    }

    #[test]
    fn test_empty_ring_has_no_owner() {
        let ring = HashRing::build(&[], 100);
        assert!(ring.is_empty());
        assert_eq!(ring.owner(42), None);
    }

    #[test]
    fn test_hash_past_last_point_wraps_to_first() {
        let ring = HashRing::build(&ids(3), 10);
        let first = ring.points()[0];
        let last = ring.points()[ring.len() - 1];

        if last.hash < u32::MAX {
            assert_eq!(ring.owner(last.hash + 1), Some(first.node));
        }
        assert!(ring.owner(u32::MAX).is_some());
        assert_eq!(ring.owner(0), Some(first.node));
    }

    #[test]
    fn test_every_node_owns_some_points() {
        let ring = HashRing::build(&ids(5), 100);
        for node in 0..5 {
            assert!(ring.points().iter().any(|p| p.node == node));
        }
    }

    proptest! {
        #[test]
        fn prop_every_hash_resolves_to_a_node(hash in any::<u32>(), nodes in 1usize..8) {
            let ring = HashRing::build(&ids(nodes), 16);
            let owner = ring.owner(hash);
            prop_assert!(owner.is_some());
            prop_assert!(owner.unwrap() < nodes);
        }
    }
}
