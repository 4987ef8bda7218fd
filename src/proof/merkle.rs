//! Merkle Tree Commitments
//!
//! Binary Merkle tree using SHA-256 for set-like collections (teams, players,
//! admins). Records are sorted by their canonical bytes before hashing, so two
//! equal sets give the same root regardless of insertion order.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use crate::core::hash::{hash_with_domain, RootHash};

/// Domain separator for Merkle tree leaf nodes.
const MERKLE_LEAF_DOMAIN: &[u8] = b"BRACKET_LEDGER_MERKLE_LEAF_V1";

/// Domain separator for the empty root.
const MERKLE_EMPTY_DOMAIN: &[u8] = b"BRACKET_LEDGER_MERKLE_EMPTY_V1";

/// Domain separator for Merkle tree internal nodes.
const MERKLE_NODE_DOMAIN: &[u8] = b"BRACKET_LEDGER_MERKLE_NODE_V1";

/// Root of an empty collection (and padding leaf).
pub fn empty_hash() -> RootHash {
    hash_with_domain(MERKLE_EMPTY_DOMAIN, &[])
}

/// Binary Merkle tree with inclusion proofs.
#[derive(Clone, Debug, Default)]
pub struct MerkleTree {
    /// Leaf hashes (level 0, unpadded)
    leaves: Vec<RootHash>,
    /// All tree levels (padded leaves at index 0, root at last index)
    levels: Vec<Vec<RootHash>>,
}

impl MerkleTree {
    /// Build from leaf data, sorted by byte order before hashing.
    pub fn from_sorted_leaves<I, T>(data: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut records: Vec<T> = data.into_iter().collect();
        records.sort_unstable_by(|a, b| a.as_ref().cmp(b.as_ref()));
        Self::from_leaf_hashes(records.iter().map(|d| hash_leaf(d.as_ref())).collect())
    }

    fn from_leaf_hashes(leaves: Vec<RootHash>) -> Self {
        let mut tree = Self { leaves, levels: Vec::new() };
        tree.build();
        tree
    }

    /// Compute all internal nodes.
    fn build(&mut self) {
        self.levels.clear();
        if self.leaves.is_empty() {
            return;
        }

        // Pad to power of 2 for balanced tree
        let mut current_level = self.leaves.clone();
        current_level.resize(current_level.len().next_power_of_two(), empty_hash());
        self.levels.push(current_level.clone());

        while current_level.len() > 1 {
            let next_level: Vec<RootHash> = current_level
                .chunks(2)
                .map(|pair| hash_nodes(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            self.levels.push(next_level.clone());
            current_level = next_level;
        }
    }

    /// Root hash. Empty trees return `empty_hash()`.
    pub fn root(&self) -> RootHash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_else(empty_hash)
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Position of a leaf hash, if present.
    pub fn index_of(&self, leaf_hash: &RootHash) -> Option<usize> {
        self.leaves.iter().position(|h| h == leaf_hash)
    }

    /// Generate a Merkle inclusion proof for a leaf at the given index.
    ///
    /// Returns None if index is out of bounds.
    pub fn generate_proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() {
            return None;
        }

        let mut siblings = Vec::new();
        let mut current_index = index;

        // Walk up the tree, collecting sibling hashes
        for level in &self.levels[..self.levels.len().saturating_sub(1)] {
            let sibling_index = current_index ^ 1;
            if sibling_index < level.len() {
                let is_right = current_index % 2 == 0;
                siblings.push((level[sibling_index], is_right));
            }
            current_index /= 2;
        }

        Some(MerkleProof {
            leaf_index: index,
            siblings,
        })
    }

    /// Verify a Merkle proof against a root hash.
    pub fn verify_proof(root: &RootHash, proof: &MerkleProof, leaf_data: &[u8]) -> bool {
        Self::verify_proof_with_hash(root, proof, &hash_leaf(leaf_data))
    }

    /// Verify a proof using a pre-hashed leaf.
    pub fn verify_proof_with_hash(root: &RootHash, proof: &MerkleProof, leaf_hash: &RootHash) -> bool {
        let computed = proof
            .siblings
            .iter()
            .fold(*leaf_hash, |current, (sibling, is_right)| {
                if *is_right {
                    hash_nodes(&current, sibling)
                } else {
                    hash_nodes(sibling, &current)
                }
            });
        computed == *root
    }
}

/// Merkle inclusion proof.
///
/// Contains the path from a leaf to the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Index of the leaf this proof is for.
    pub leaf_index: usize,
    /// Sibling hashes along the path (hash, is_right_sibling).
    pub siblings: Vec<(RootHash, bool)>,
}

impl MerkleProof {
    /// Number of levels between the leaf and the root.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }
}

/// Hash leaf data with domain separation.
pub fn hash_leaf(data: &[u8]) -> RootHash {
    hash_with_domain(MERKLE_LEAF_DOMAIN, data)
}

/// Hash two child nodes with domain separation.
pub fn hash_nodes(left: &RootHash, right: &RootHash) -> RootHash {
    let mut hasher = Sha256::new();
    hasher.update(MERKLE_NODE_DOMAIN);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::default();
        assert_eq!(tree.root(), empty_hash());
        assert_eq!(MerkleTree::from_sorted_leaves(Vec::<Vec<u8>>::new()).root(), empty_hash());
    }

    #[test]
    fn test_sorted_root_ignores_order() {
        let a = MerkleTree::from_sorted_leaves(["x", "y", "z"]);
        let b = MerkleTree::from_sorted_leaves(["z", "x", "y"]);
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_leaves_ordered_by_record_bytes() {
        let tree = MerkleTree::from_sorted_leaves(["carol", "alice", "bob"]);
        let positions: Vec<_> = ["alice", "bob", "carol"]
            .iter()
            .map(|name| tree.index_of(&hash_leaf(name.as_bytes())))
            .collect();
        assert_eq!(positions, vec![Some(0), Some(1), Some(2)]);

        let expected = hash_nodes(
            &hash_nodes(&hash_leaf(b"alice"), &hash_leaf(b"bob")),
            &hash_nodes(&hash_leaf(b"carol"), &empty_hash()),
        );
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn test_different_leaves_different_root() {
        let tree1 = MerkleTree::from_sorted_leaves([b"a", b"b"]);
        let tree2 = MerkleTree::from_sorted_leaves([b"a", b"c"]);
        assert_ne!(tree1.root(), tree2.root());
    }

    #[test]
    fn test_merkle_proof_verification() {
        let leaves: Vec<&[u8]> = vec![b"leaf1", b"leaf2", b"leaf3", b"leaf4", b"leaf5"];
        let tree = MerkleTree::from_sorted_leaves(&leaves);
        let root = tree.root();

        for leaf in &leaves {
            let index = tree.index_of(&hash_leaf(leaf)).unwrap();
            let proof = tree.generate_proof(index).unwrap();
            assert!(MerkleTree::verify_proof(&root, &proof, leaf));
        }
        let proof = tree.generate_proof(0).unwrap();
        assert_eq!(proof.depth(), 3);
        assert!(!MerkleTree::verify_proof(&root, &proof, b"wrong_data"));
        assert!(tree.generate_proof(10).is_none());
    }

    #[test]
    fn test_proof_for_sorted_leaf() {
        let tree = MerkleTree::from_sorted_leaves(["carol", "alice", "bob"]);
        let index = tree.index_of(&hash_leaf(b"alice")).unwrap();
        let proof = tree.generate_proof(index).unwrap();
        assert!(MerkleTree::verify_proof(&tree.root(), &proof, b"alice"));
        assert!(tree.index_of(&hash_leaf(b"dave")).is_none());
    }
}
