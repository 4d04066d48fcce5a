//! The public surface: `submit`, `run`, `cancel`, `inspect`.
//!
//! The core is a library, not a network service — these four operations are
//! its entire contract with a caller.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::events::EventSink;
use crate::options::RunOptions;
use crate::payload::AgentPayload;
use crate::scheduler::{RunResult, RunSnapshot, Scheduler, TaskAgents};
use crate::task::TaskNode;

/// A handle to one submitted run. Cheaply cloned; every clone refers to the
/// same underlying scheduler state.
#[derive(Clone)]
pub struct RunHandle {
    scheduler: Arc<Scheduler>,
}

/// Validate `nodes` and build execution levels; returns a handle to drive
/// with [`run`]. Rejects the whole submission before any task executes if
/// the graph is cyclic or references an unknown dependency.
pub fn submit(
    run_id: impl Into<String>,
    nodes: Vec<TaskNode>,
    initial_payloads: HashMap<String, AgentPayload>,
    agents: HashMap<String, TaskAgents>,
    options: RunOptions,
) -> Result<RunHandle> {
    let scheduler = Scheduler::submit(run_id, nodes, initial_payloads, agents, options)?;
    Ok(RunHandle { scheduler: Arc::new(scheduler) })
}

/// Like [`submit`], but routes observability events to `sink` instead of the
/// default in-memory one.
pub fn submit_with_sink(
    run_id: impl Into<String>,
    nodes: Vec<TaskNode>,
    initial_payloads: HashMap<String, AgentPayload>,
    agents: HashMap<String, TaskAgents>,
    options: RunOptions,
    sink: Arc<dyn EventSink>,
) -> Result<RunHandle> {
    let scheduler = Scheduler::submit(run_id, nodes, initial_payloads, agents, options)?.with_sink(sink);
    Ok(RunHandle { scheduler: Arc::new(scheduler) })
}

/// Drive `handle` to completion or irrecoverable failure and return the
/// terminal result bundle.
pub async fn run(handle: &RunHandle) -> Result<RunResult> {
    handle.scheduler.run().await
}

/// Signal global cancellation. In-flight tasks observe it at their next
/// checkpoint (the next level boundary, or between serial tasks); already
/// sealed checkpoints are preserved for rollback.
pub fn cancel(handle: &RunHandle) {
    handle.scheduler.cancel();
}

/// A non-blocking snapshot of task states and circuit-breaker states.
pub async fn inspect(handle: &RunHandle) -> RunSnapshot {
    handle.scheduler.snapshot().await
}
