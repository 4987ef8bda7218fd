//! Merkle Mountain Range
//!
//! Append-friendly hash tree for order-sensitive collections (matches, logs).
//! Appending a leaf touches at most `log2(n)` nodes, and an in-place leaf
//! update recomputes only its path to the peak.
//!
//! Node layout: `layers[h][i]` is the `i`-th complete subtree of height `h`.
//! A layer with odd length ends in a peak.

use crate::core::hash::{RootHash, StateHasher};
use crate::proof::merkle::{empty_hash, hash_leaf, hash_nodes};

/// Domain separator for the bagged root.
const MMR_ROOT_DOMAIN: &[u8] = b"BRACKET_LEDGER_MMR_ROOT_V1";

/// Merkle Mountain Range over leaf hashes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleMountainRange {
    layers: Vec<Vec<RootHash>>,
}

impl MerkleMountainRange {
    /// Empty range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build by appending every item in order.
    pub fn from_leaves<I, T>(data: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut mmr = Self::new();
        for item in data {
            mmr.push(item.as_ref());
        }
        mmr
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Whether no leaf was appended yet.
    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }

    /// Append raw leaf data.
    pub fn push(&mut self, data: &[u8]) {
        self.push_hash(hash_leaf(data));
    }

    /// Append a pre-hashed leaf, merging completed subtrees upward.
    pub fn push_hash(&mut self, leaf: RootHash) {
        let mut height = 0;
        let mut node = leaf;
        loop {
            if self.layers.len() == height {
                self.layers.push(Vec::new());
            }
            let layer = &mut self.layers[height];
            layer.push(node);
            let index = layer.len() - 1;
            if index % 2 == 0 {
                break;
            }
            node = hash_nodes(&layer[index - 1], &layer[index]);
            height += 1;
        }
    }

    /// Replace raw leaf data at `index`. Returns false if out of range.
    pub fn update(&mut self, index: usize, data: &[u8]) -> bool {
        self.update_hash(index, hash_leaf(data))
    }

    /// Replace a leaf hash and recompute its path. Returns false if out of range.
    pub fn update_hash(&mut self, index: usize, leaf: RootHash) -> bool {
        let Some(slot) = self.layers.first_mut().and_then(|l| l.get_mut(index)) else {
            return false;
        };
        *slot = leaf;

        let mut height = 0;
        let mut index = index;
        while height + 1 < self.layers.len() {
            let layer = &self.layers[height];
            let (left, right) = if index % 2 == 1 {
                (index - 1, index)
            } else {
                (index, index + 1)
            };
            // No right sibling yet: this node is a peak.
            if right >= layer.len() {
                break;
            }
            let parent = hash_nodes(&layer[left], &layer[right]);
            index /= 2;
            height += 1;
            self.layers[height][index] = parent;
        }
        true
    }

    /// Peaks from the tallest (leftmost) to the shortest (rightmost).
    pub fn peaks(&self) -> Vec<RootHash> {
        self.layers
            .iter()
            .rev()
            .filter(|layer| layer.len() % 2 == 1)
            .filter_map(|layer| layer.last().copied())
            .collect()
    }

    /// Root: peaks bagged right to left, bound to the leaf count.
    ///
    /// Empty ranges return `empty_hash()`.
    pub fn root(&self) -> RootHash {
        let peaks = self.peaks();
        let Some((&last, rest)) = peaks.split_last() else {
            return empty_hash();
        };
        let bagged = rest
            .iter()
            .rev()
            .fold(last, |acc, peak| hash_nodes(peak, &acc));

        let mut hasher = StateHasher::new(MMR_ROOT_DOMAIN);
        hasher.update_u64(self.leaf_count() as u64);
        hasher.update_hash(&bagged);
        hasher.finalize()
    }
}
