//! # warden-core
//!
//! The multi-agent orchestration core: a DAG scheduler that executes
//! content-production tasks across heterogeneous agents (generator,
//! validator, adversarial reviewer, publisher) under integrity, confidence,
//! and failure-mode constraints.
//!
//! ## Core concepts
//!
//! - [`task::TaskNode`] / [`task::TaskRecord`] — the immutable submission-time
//!   task and the scheduler's mutable view of it in flight.
//! - [`payload::AgentPayload`] — the hash-sealed, confidence-scored message
//!   agents exchange.
//! - [`registry::DependencyRegistry`] / [`registry::compute_levels`] —
//!   submission validation and topological leveling.
//! - [`breaker::CircuitBreaker`] — per-agent admission control.
//! - [`agent::AgentExecutor`] — the contract an agent implementation fulfills.
//! - [`pipeline`] — the eight-step per-task execution pipeline.
//! - [`scheduler::Scheduler`] — the level-by-level execution loop, rollback
//!   policy, and terminal result bundle.
//! - [`run`] — the public `submit`/`run`/`cancel`/`inspect` surface.
//! - [`events`] — typed observability events emitted to a caller-provided sink.
//! - [`options::RunOptions`] — the configuration surface passed to `submit`.
//!
//! State verification, Merkle proofs, and checkpoint TTL live one layer down
//! in `warden-checkpoint`, which this crate depends on but never duplicates.
//!
//! ## Guardrails
//!
//! Five behavioral invariants are enforced at specific points in the
//! pipeline and scheduler: sycophancy (step 7), desynchronization (expired
//! checkpoints forcing a refresh during rollback), hallucinated dependencies
//! (submission validation), confidence collapse (step 6), and phantom
//! success (step 4). [`events::GuardrailKind`] names all five.

pub mod agent;
pub mod breaker;
pub mod error;
pub mod events;
pub mod options;
pub mod payload;
pub mod pipeline;
pub mod registry;
pub mod run;
pub mod scheduler;
pub mod task;

pub use error::{OrchestratorError, Result};
pub use options::RunOptions;
pub use payload::AgentPayload;
pub use run::{cancel, inspect, run, submit, submit_with_sink, RunHandle};
pub use scheduler::{ConfidenceStats, RunResult, RunSnapshot, TaskAgents};
pub use task::{AgentRole, ParallelizationHint, TaskNode, TaskStatus};

/// The crate version, for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
