//! Balanced Merkle tree over ordered leaves, with O(log n) inclusion proofs.
//!
//! Leaf and internal-node hashes are domain-separated (a `0x00`/`0x01`
//! prefix byte) so a leaf hash can never be replayed as an internal node
//! and vice versa. Unlike the "promote the lone node" convention some
//! Merkle implementations use for an odd level, this tree duplicates the
//! last hash when a level has an odd count, folding until one root
//! remains — every level a power-of-two count going in.

use sha2::{Digest, Sha256};

use crate::error::{CheckpointError, Result};
use crate::hash::Hash;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

fn hash_leaf(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(data);
    hasher.finalize().into()
}

fn hash_node(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// A sibling hash and which side it sits on, read bottom-up from the leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling: [u8; 32],
    pub sibling_is_left: bool,
}

/// An inclusion proof for one leaf against a specific root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    pub leaf_index: usize,
    pub tree_size: usize,
    pub steps: Vec<ProofStep>,
}

/// A balanced Merkle tree built bottom-up from raw leaf byte strings.
pub struct MerkleTree {
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree over `leaves`, each hashed with the leaf domain prefix.
    ///
    /// An empty leaf set hashes to the SHA-256 of the empty byte string,
    /// domain-separated the same way a real leaf would be.
    pub fn build(leaves: &[Vec<u8>]) -> Self {
        let mut level: Vec<[u8; 32]> = leaves.iter().map(|l| hash_leaf(l)).collect();
        if level.is_empty() {
            level.push(hash_leaf(&[]));
        }
        let mut levels = vec![level.clone()];
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut i = 0;
            while i < level.len() {
                let left = level[i];
                let right = if i + 1 < level.len() { level[i + 1] } else { level[i] };
                next.push(hash_node(&left, &right));
                i += 2;
            }
            levels.push(next.clone());
            level = next;
        }
        Self { levels }
    }

    /// Root hash of the tree, as lowercase hex.
    pub fn root(&self) -> Hash {
        hex::encode(self.levels.last().expect("at least one level always present")[0])
    }

    /// Number of leaves the tree was built over (pre-padding).
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Build the inclusion proof for the leaf at `leaf_index`.
    pub fn prove(&self, leaf_index: usize) -> Result<InclusionProof> {
        let leaf_count = self.leaf_count();
        if leaf_index >= leaf_count {
            return Err(CheckpointError::MerkleProof(format!(
                "leaf index {leaf_index} out of range for {leaf_count} leaves"
            )));
        }
        let mut steps = Vec::new();
        let mut index = leaf_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = if index % 2 == 0 { index + 1 } else { index - 1 };
            let sibling = if sibling_index < level.len() {
                level[sibling_index]
            } else {
                level[index]
            };
            steps.push(ProofStep {
                sibling,
                sibling_is_left: index % 2 == 1,
            });
            index /= 2;
        }
        Ok(InclusionProof {
            leaf_index,
            tree_size: leaf_count,
            steps,
        })
    }
}

/// Verify that `leaf` at `proof.leaf_index` participates in `root`.
pub fn verify_inclusion(root: &Hash, leaf: &[u8], proof: &InclusionProof) -> bool {
    let mut current = hash_leaf(leaf);
    for step in &proof.steps {
        current = if step.sibling_is_left {
            hash_node(&step.sibling, &current)
        } else {
            hash_node(&current, &step.sibling)
        };
    }
    hex::encode(current) == *root
}
