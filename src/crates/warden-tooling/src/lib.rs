//! Ambient tooling shared by every `warden` crate.
//!
//! Nothing in here knows about tasks, agents, or checkpoints — it is the
//! same kind of grab-bag crate every layered workspace grows at the bottom:
//! environment-driven configuration, error-context plumbing, and
//! structured-logging helpers.
//!
//! # Modules
//!
//! - `config` - environment variable overrides for run configuration
//! - `error` - error-context extension trait and error-chain formatting
//! - `logging` - structured logging helpers and credential redaction

pub mod config;
pub mod error;
pub mod logging;

use thiserror::Error;

/// Errors that can occur in the tooling crate.
#[derive(Debug, Error)]
pub enum ToolingError {
    #[error("tooling error: {0}")]
    General(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for tooling operations.
pub type Result<T> = std::result::Result<T, ToolingError>;
