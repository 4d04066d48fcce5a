//! Error types for orchestration: submission, task-scoped, and verifier-verdict errors.
//!
//! `OrchestratorError` gives every failure kind in the taxonomy its own
//! variant with enough structured context to pattern-match on, rather than
//! a single stringly-typed error. [`OrchestratorError::retryable`] is the
//! one place the retryable/non-retryable split from the task-scoped
//! categories is encoded, so the pipeline and scheduler don't duplicate it.

use thiserror::Error;

use warden_checkpoint::CheckpointError;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug, Clone)]
pub enum OrchestratorError {
    // --- Submission errors: pre-run, fatal to the submission ---
    #[error("circular dependency detected among tasks: {cycle:?}")]
    CircularDependency { cycle: Vec<String> },

    #[error("task '{task_id}' depends on unknown task '{missing_dependency}'")]
    HallucinatedDependency {
        task_id: String,
        missing_dependency: String,
    },

    #[error("task '{task_id}' payload rejected by schema: {reason}")]
    SchemaRejected { task_id: String, reason: String },

    // --- Task-scoped retryable ---
    #[error("agent '{agent_id}' timed out on task '{task_id}'")]
    AgentTimeout { task_id: String, agent_id: String },

    #[error("agent '{agent_id}' returned a transient error on task '{task_id}': {reason}")]
    AgentTransient {
        task_id: String,
        agent_id: String,
        reason: String,
    },

    #[error("breaker for agent '{agent_id}' rejected a half-open probe for task '{task_id}'")]
    BreakerHalfOpenReject { task_id: String, agent_id: String },

    // --- Task-scoped non-retryable ---
    #[error("input integrity violation on task '{task_id}': expected hash {expected}, got {actual}")]
    IntegrityViolation {
        task_id: String,
        expected: String,
        actual: String,
    },

    #[error("agent '{agent_id}' reported phantom success on task '{task_id}'")]
    ToolPhantomSuccess { task_id: String, agent_id: String },

    #[error("confidence collapse on task '{task_id}': {confidence} below floor, or depth exceeded")]
    ConfidenceCollapse { task_id: String, confidence: f64 },

    #[error("task '{task_id}' output failed schema validation: {reason}")]
    SchemaViolation { task_id: String, reason: String },

    #[error("sycophancy suspected on task '{task_id}': adversary produced no independent reasoning")]
    SycophancySuspected { task_id: String },

    // --- Breaker gating ---
    #[error("circuit breaker open for agent '{agent_id}'")]
    BreakerOpen { agent_id: String },

    // --- Verifier verdicts ---
    #[error("checkpoint '{checkpoint_id}' expired")]
    CheckpointExpired { checkpoint_id: String },

    #[error("checkpoint '{checkpoint_id}' hash mismatch")]
    CheckpointMismatch { checkpoint_id: String },

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("run '{run_id}' was cancelled")]
    Cancelled { run_id: String },

    #[error("{0}")]
    Custom(String),
}

impl From<CheckpointError> for OrchestratorError {
    fn from(e: CheckpointError) -> Self {
        OrchestratorError::Checkpoint(e.to_string())
    }
}

impl OrchestratorError {
    /// Task-scoped retryable kinds are retried up to the task's budget;
    /// everything else (submission errors, non-retryable task errors,
    /// breaker gating, verifier verdicts) aborts the task on first sight.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrchestratorError::AgentTimeout { .. }
                | OrchestratorError::AgentTransient { .. }
                | OrchestratorError::BreakerHalfOpenReject { .. }
        )
    }

    /// Errors that must bypass remaining retries and go straight to rollback.
    pub fn forces_rollback(&self) -> bool {
        matches!(
            self,
            OrchestratorError::ConfidenceCollapse { .. }
                | OrchestratorError::IntegrityViolation { .. }
        )
    }

    /// A short machine-readable kind, for observability events and the
    /// terminal result bundle.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            OrchestratorError::HallucinatedDependency { .. } => "HALLUCINATED_DEPENDENCY",
            OrchestratorError::SchemaRejected { .. } => "SCHEMA_REJECTED",
            OrchestratorError::AgentTimeout { .. } => "AGENT_TIMEOUT",
            OrchestratorError::AgentTransient { .. } => "AGENT_TRANSIENT",
            OrchestratorError::BreakerHalfOpenReject { .. } => "BREAKER_HALF_OPEN_REJECT",
            OrchestratorError::IntegrityViolation { .. } => "INTEGRITY_VIOLATION",
            OrchestratorError::ToolPhantomSuccess { .. } => "TOOL_PHANTOM_SUCCESS",
            OrchestratorError::ConfidenceCollapse { .. } => "CONFIDENCE_COLLAPSE",
            OrchestratorError::SchemaViolation { .. } => "SCHEMA_VIOLATION",
            OrchestratorError::SycophancySuspected { .. } => "SYCOPHANCY_SUSPECTED",
            OrchestratorError::BreakerOpen { .. } => "BREAKER_OPEN",
            OrchestratorError::CheckpointExpired { .. } => "CHECKPOINT_EXPIRED",
            OrchestratorError::CheckpointMismatch { .. } => "CHECKPOINT_MISMATCH",
            OrchestratorError::Checkpoint(_) => "CHECKPOINT_ERROR",
            OrchestratorError::Cancelled { .. } => "CANCELLED",
            OrchestratorError::Custom(_) => "CUSTOM",
        }
    }
}
