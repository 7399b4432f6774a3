//! Merkle root over transaction hashes.

use crate::hash::hash256;
use onyx_core::UInt256;

/// Computes Merkle roots with Hash256 node hashing.
pub struct MerkleTree;

impl MerkleTree {
    /// Computes the root of `hashes`.
    ///
    /// Each level hashes adjacent pairs; an odd trailing node is paired with
    /// itself. An empty list yields the zero hash and a single hash is its
    /// own root.
    pub fn compute_root(hashes: &[UInt256]) -> UInt256 {
        if hashes.is_empty() {
            return UInt256::zero();
        }

        let mut level: Vec<UInt256> = hashes.to_vec();
        while level.len() > 1 {
            let mut next = Vec::with_capacity((level.len() + 1) / 2);
            for pair in level.chunks(2) {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);
                let mut buffer = [0u8; 64];
                buffer[..32].copy_from_slice(left.as_bytes());
                buffer[32..].copy_from_slice(right.as_bytes());
                next.push(UInt256::from_array(hash256(&buffer)));
            }
            level = next;
        }
        level[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> UInt256 {
        UInt256::from_array([byte; 32])
    }

    fn join(left: UInt256, right: UInt256) -> UInt256 {
        let mut buffer = left.to_array().to_vec();
        buffer.extend_from_slice(right.as_bytes());
        UInt256::from_array(hash256(&buffer))
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(MerkleTree::compute_root(&[]), UInt256::zero());
        assert_eq!(MerkleTree::compute_root(&[leaf(1)]), leaf(1));
    }

    #[test]
    fn test_odd_level_duplicates_last() {
        let (a, b, c) = (leaf(1), leaf(2), leaf(3));
        let expected = join(join(a, b), join(c, c));
        assert_eq!(MerkleTree::compute_root(&[a, b, c]), expected);
    }

    #[test]
    fn test_order_matters() {
        let (a, b) = (leaf(1), leaf(2));
        assert_ne!(
            MerkleTree::compute_root(&[a, b]),
            MerkleTree::compute_root(&[b, a])
        );
    }
}
