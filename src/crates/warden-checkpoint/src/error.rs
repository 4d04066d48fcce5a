//! Error types for checkpoint and verification operations.

use thiserror::Error;

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur while hashing, sealing, or verifying checkpoints.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("checkpoint not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid checkpoint: {0}")]
    Invalid(String),

    /// A leaf index or inclusion proof does not fit the tree it is checked against.
    #[error("merkle proof error: {0}")]
    MerkleProof(String),

    #[error("{0}")]
    Custom(String),
}
