//! The checkpoint record: a hash-and-Merkle-bound snapshot of state at a
//! task boundary, with a TTL.
//!
//! A checkpoint is *live* while its age is less than its TTL and its state
//! hash re-verifies against the snapshot it was sealed with; otherwise it
//! is *expired* or *corrupt*. [`Checkpoint`] itself is an inert, cheaply
//! cloned record — [`crate::verifier::StateVerifier`] owns the store and the
//! TTL clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::hash::{content_hash, Hash};
use crate::merkle::MerkleTree;

/// Default checkpoint time-to-live, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Split a state snapshot into ordered Merkle leaves.
///
/// Objects are split one leaf per sorted-key entry (so adding an unrelated
/// field doesn't move every other leaf's index); arrays are split one leaf
/// per element; any other scalar snapshot is a single leaf over the whole
/// value. All leaves are the canonical byte encoding of their slice.
pub fn snapshot_leaves(snapshot: &Value) -> Result<Vec<Vec<u8>>> {
    match snapshot {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries
                .into_iter()
                .map(|(k, v)| crate::hash::canonical_bytes(&serde_json::json!([k, v])))
                .collect()
        }
        Value::Array(items) => items.iter().map(crate::hash::canonical_bytes).collect(),
        other => Ok(vec![crate::hash::canonical_bytes(other)?]),
    }
}

/// A sealed snapshot of state at a task boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub snapshot: Value,
    pub state_hash: Hash,
    pub merkle_root: Hash,
    pub predecessor_hash: Option<Hash>,
    pub ttl_secs: u64,
}

impl Checkpoint {
    /// Seal a new checkpoint: compute its state hash and Merkle root now.
    pub fn seal(
        id: impl Into<String>,
        snapshot: Value,
        ttl_secs: u64,
        predecessor_hash: Option<Hash>,
    ) -> Result<Self> {
        let state_hash = content_hash(&snapshot)?;
        let leaves = snapshot_leaves(&snapshot)?;
        let merkle_root = MerkleTree::build(&leaves).root();
        Ok(Self {
            id: id.into(),
            created_at: Utc::now(),
            snapshot,
            state_hash,
            merkle_root,
            predecessor_hash,
            ttl_secs,
        })
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    pub fn is_expired(&self) -> bool {
        self.age().num_seconds() >= self.ttl_secs as i64
    }

    /// Re-derive the Merkle tree over this checkpoint's own snapshot, for
    /// building inclusion proofs against its stored root.
    pub fn merkle_tree(&self) -> Result<MerkleTree> {
        let leaves = snapshot_leaves(&self.snapshot)?;
        Ok(MerkleTree::build(&leaves))
    }
}

/// Outcome of [`crate::verifier::StateVerifier::verify_checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Expired,
    HashMismatch,
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seal_computes_hash_and_root() {
        let cp = Checkpoint::seal("cp1", json!({"a": 1, "b": 2}), 300, None).unwrap();
        assert_eq!(cp.state_hash, content_hash(&json!({"a": 1, "b": 2})).unwrap());
        assert!(!cp.merkle_root.is_empty());
    }

    #[test]
    fn key_order_does_not_change_state_hash() {
        let a = Checkpoint::seal("a", json!({"x": 1, "y": 2}), 300, None).unwrap();
        let b = Checkpoint::seal("b", json!({"y": 2, "x": 1}), 300, None).unwrap();
        assert_eq!(a.state_hash, b.state_hash);
        assert_eq!(a.merkle_root, b.merkle_root);
    }

    #[test]
    fn is_expired_respects_ttl() {
        let cp = Checkpoint::seal("cp", json!({"v": 1}), 0, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cp.is_expired());
    }

    #[test]
    fn predecessor_hash_is_carried() {
        let cp = Checkpoint::seal("cp2", json!({"v": 1}), 300, Some("prev-hash".into())).unwrap();
        assert_eq!(cp.predecessor_hash.as_deref(), Some("prev-hash"));
    }
}
