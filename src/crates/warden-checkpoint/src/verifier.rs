//! The state verifier: creates, stores, and verifies checkpoints.
//!
//! The verifier exclusively owns the checkpoint store; nothing else reads
//! or writes it directly. It never throws on a stale or tampered
//! checkpoint — [`Verdict`] is a typed outcome the scheduler branches on,
//! not an error path.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::checkpoint::{Checkpoint, Verdict, DEFAULT_TTL_SECS};
use crate::error::Result;
use crate::hash::{content_hash, Hash};
use crate::merkle::{verify_inclusion, InclusionProof};

/// In-memory, concurrency-safe checkpoint store.
///
/// A single `RwLock<HashMap>` gives per-key read-your-writes consistency:
/// reads (verification, inspection) take the shared lock, writes (create,
/// gc) take the exclusive one, and every write is visible to the very next
/// read on the same key.
#[derive(Clone, Default)]
pub struct StateVerifier {
    store: Arc<RwLock<HashMap<String, Checkpoint>>>,
}

impl StateVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal a new checkpoint and store it, returning the sealed record.
    pub async fn create_checkpoint(
        &self,
        id: impl Into<String>,
        snapshot: Value,
        ttl_secs: Option<u64>,
        predecessor_hash: Option<Hash>,
    ) -> Result<Checkpoint> {
        let id = id.into();
        let checkpoint = Checkpoint::seal(
            id.clone(),
            snapshot,
            ttl_secs.unwrap_or(DEFAULT_TTL_SECS),
            predecessor_hash,
        )?;
        tracing::debug!(checkpoint_id = %id, state_hash = %checkpoint.state_hash, "checkpoint sealed");
        self.store.write().await.insert(id, checkpoint.clone());
        Ok(checkpoint)
    }

    /// Look up a stored checkpoint by id without affecting its verdict.
    pub async fn get(&self, id: &str) -> Option<Checkpoint> {
        self.store.read().await.get(id).cloned()
    }

    /// VALID requires: the checkpoint exists, its age is under TTL, and the
    /// canonical hash of `current_snapshot` equals the stored state hash.
    pub async fn verify_checkpoint(&self, id: &str, current_snapshot: &Value) -> Result<Verdict> {
        let store = self.store.read().await;
        let Some(checkpoint) = store.get(id) else {
            return Ok(Verdict::NotFound);
        };
        if checkpoint.is_expired() {
            tracing::warn!(checkpoint_id = %id, "checkpoint expired");
            return Ok(Verdict::Expired);
        }
        let current_hash = content_hash(current_snapshot)?;
        if current_hash != checkpoint.state_hash {
            tracing::error!(
                checkpoint_id = %id,
                stored_hash = %checkpoint.state_hash,
                recomputed_hash = %current_hash,
                "checkpoint hash mismatch"
            );
            return Ok(Verdict::HashMismatch);
        }
        Ok(Verdict::Valid)
    }

    /// Validate a single leaf against a stored checkpoint's Merkle root.
    pub async fn verify_leaf(
        &self,
        id: &str,
        leaf: &[u8],
        proof: &InclusionProof,
    ) -> Result<Verdict> {
        let store = self.store.read().await;
        let Some(checkpoint) = store.get(id) else {
            return Ok(Verdict::NotFound);
        };
        if checkpoint.is_expired() {
            return Ok(Verdict::Expired);
        }
        if verify_inclusion(&checkpoint.merkle_root, leaf, proof) {
            Ok(Verdict::Valid)
        } else {
            Ok(Verdict::HashMismatch)
        }
    }

    /// Remove every checkpoint whose age exceeds its TTL. Idempotent.
    pub async fn gc_expired(&self) -> usize {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, checkpoint| !checkpoint.is_expired());
        before - store.len()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
