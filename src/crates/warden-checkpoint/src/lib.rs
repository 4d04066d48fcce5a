//! Canonical hashing, Merkle trees, and checkpoint verification.
//!
//! This crate is the bottom two components of the orchestration core: the
//! Hash & Merkle kernel (stable serialization, SHA-256 hashing, balanced
//! Merkle trees with O(log n) inclusion proofs) and the State Verifier
//! (checkpoint creation, TTL-based staleness, predecessor-hash chaining).
//! It has no knowledge of agents, tasks, or the scheduler — `warden-core`
//! builds on top of it.
//!
//! # Modules
//!
//! - `hash` - canonical byte encoding and SHA-256 content hashing
//! - `merkle` - balanced Merkle tree construction and inclusion proofs
//! - `checkpoint` - the sealed checkpoint record and its verdict type
//! - `verifier` - the checkpoint store: create, verify, gc

pub mod checkpoint;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod verifier;

pub use checkpoint::{Checkpoint, Verdict, DEFAULT_TTL_SECS};
pub use error::{CheckpointError, Result};
pub use hash::{content_hash, Hash};
pub use merkle::{InclusionProof, MerkleTree};
pub use verifier::StateVerifier;
