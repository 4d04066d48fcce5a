//! Task nodes and the state machine the scheduler drives them through.
//!
//! `AgentRole` is a tagged enum and pipeline hooks are keyed by role, not a
//! subclass hierarchy, which keeps the pipeline testable with trivial fake
//! agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The role a task requires of the agent it dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    Generator,
    Validator,
    Adversarial,
    Publisher,
    Worker,
}

/// How a task may be scheduled relative to siblings in its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParallelizationHint {
    SerialRequired,
    CanParallelize,
    ParallelPreferred,
}

/// An immutable task node as submitted. Dependencies, schemas, and limits
/// are fixed for the lifetime of the submission — only `TaskRecord` (the
/// scheduler's view of a running task) mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    pub dependencies: Vec<String>,
    pub agent_role: AgentRole,
    pub parallelization: ParallelizationHint,
    pub input_schema: Value,
    pub output_schema: Value,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub idempotent: bool,
    /// When true, an adversarial cross-check runs after the primary agent.
    pub high_stakes: bool,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, agent_role: AgentRole) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            agent_role,
            parallelization: ParallelizationHint::CanParallelize,
            input_schema: Value::Null,
            output_schema: Value::Null,
            timeout_ms: 30_000,
            max_retries: 3,
            idempotent: false,
            high_stakes: false,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_parallelization(mut self, hint: ParallelizationHint) -> Self {
        self.parallelization = hint;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }

    pub fn with_high_stakes(mut self, high_stakes: bool) -> Self {
        self.high_stakes = high_stakes;
        self
    }
}

/// PENDING → READY → RUNNING → (SUCCESS | FAILED | RETRYING | ROLLED_BACK).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Ready,
    Running,
    Success,
    Failed,
    Retrying,
    RolledBack,
}

/// One retry attempt recorded against a task, kept for the terminal
/// bundle's retry history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAttempt {
    pub at: DateTime<Utc>,
    pub error_kind: String,
    pub backoff_applied_ms: u64,
}

/// The scheduler's mutable view of a task in flight. Transitions are driven
/// exclusively by the scheduler; no other component mutates this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub status: TaskStatus,
    pub retry_count: u32,
    pub last_error_kind: Option<String>,
    pub retry_history: Vec<RetryAttempt>,
    pub checkpoint_id: Option<String>,
    pub payload: Option<crate::payload::AgentPayload>,
    /// How many times the scheduler has re-dispatched this task against
    /// rolled-back state after a failure. Bounded by `TaskNode::max_retries`,
    /// the same budget the pipeline's own invoke retries draw from.
    pub rerun_count: u32,
}

impl TaskRecord {
    pub fn pending() -> Self {
        Self {
            status: TaskStatus::Pending,
            retry_count: 0,
            last_error_kind: None,
            retry_history: Vec::new(),
            checkpoint_id: None,
            payload: None,
            rerun_count: 0,
        }
    }

    pub fn record_retry(&mut self, error_kind: impl Into<String>, backoff_applied_ms: u64) {
        self.status = TaskStatus::Retrying;
        self.retry_count += 1;
        let kind = error_kind.into();
        self.last_error_kind = Some(kind.clone());
        self.retry_history.push(RetryAttempt {
            at: Utc::now(),
            error_kind: kind,
            backoff_applied_ms,
        });
    }
}

impl Default for TaskRecord {
    fn default() -> Self {
        Self::pending()
    }
}
