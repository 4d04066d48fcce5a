//! The DAG scheduler: submission validation, leveling, the level-by-level
//! execution loop, and the rollback policy.
//!
//! One future per eligible task runs behind a `Semaphore` sized to the
//! fan-out limit, giving parallel execution within a level and
//! serialization between levels without hand-rolled barrier logic.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{RwLock, Semaphore};

use warden_checkpoint::{StateVerifier, Verdict};

use crate::agent::AgentExecutor;
use crate::breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker};
use crate::error::{OrchestratorError, Result};
use crate::events::{EventSink, GuardrailKind, InMemorySink, OrchestrationEvent, SequenceCounter};
use crate::options::RunOptions;
use crate::payload::AgentPayload;
use crate::pipeline::{self, PipelineContext};
use crate::registry::{check_schemas, compute_levels, DependencyRegistry};
use crate::task::{ParallelizationHint, TaskNode, TaskRecord, TaskStatus};

/// The agent(s) bound to one task node. Binding is by task id rather than
/// by `AgentRole` alone, since two tasks can share a role but need distinct
/// backing agents.
pub struct TaskAgents {
    pub primary: Arc<dyn AgentExecutor>,
    pub adversary: Option<Arc<dyn AgentExecutor>>,
}

impl TaskAgents {
    pub fn new(primary: Arc<dyn AgentExecutor>) -> Self {
        Self { primary, adversary: None }
    }

    pub fn with_adversary(mut self, adversary: Arc<dyn AgentExecutor>) -> Self {
        self.adversary = Some(adversary);
        self
    }
}

/// A checkpoint sealed for one task, tracked in scheduler completion order
/// so the rollback walk and predecessor-chaining don't depend on wall-clock
/// timestamps.
#[derive(Clone)]
struct SealedCheckpoint {
    task_id: String,
    checkpoint_id: String,
    state_hash: String,
    completion_order: u64,
}

/// Aggregate confidence statistics over successful tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceStats {
    pub min: f64,
    pub mean: f64,
}

/// The terminal result bundle `run()` returns.
#[derive(Debug)]
pub struct RunResult {
    pub task_states: HashMap<String, TaskStatus>,
    pub sealed_checkpoints: Vec<String>,
    pub human_review_payloads: Vec<AgentPayload>,
    pub guardrail_activations: Vec<(String, GuardrailKind)>,
    pub last_good_checkpoint: Option<String>,
    pub confidence_stats: ConfidenceStats,
}

/// A non-blocking snapshot of a run in progress, for `inspect()`.
pub struct RunSnapshot {
    pub task_states: HashMap<String, TaskStatus>,
    pub breaker_states: HashMap<String, BreakerSnapshot>,
}

/// One submitted, validated run. Holds every piece of mutable state a run
/// touches; `crate::run` wraps this behind the public `submit`/`run`/
/// `cancel`/`inspect` surface.
pub struct Scheduler {
    pub run_id: String,
    options: RunOptions,
    nodes: HashMap<String, TaskNode>,
    levels: Vec<Vec<String>>,
    depths: HashMap<String, u32>,
    dependents: HashMap<String, Vec<String>>,
    agents: HashMap<String, TaskAgents>,
    initial_payloads: HashMap<String, AgentPayload>,
    records: RwLock<HashMap<String, TaskRecord>>,
    breaker: CircuitBreaker,
    verifier: StateVerifier,
    sink: Arc<dyn EventSink>,
    sequence: SequenceCounter,
    cancelled: Arc<AtomicBool>,
    completion_counter: Arc<AtomicU64>,
    sealed: RwLock<Vec<SealedCheckpoint>>,
    guardrails: RwLock<Vec<(String, GuardrailKind)>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").field("run_id", &self.run_id).finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Validate `nodes` against the dependency registry, reject cycles, and
    /// compute execution levels. All of this happens before any task
    /// executes.
    pub fn submit(
        run_id: impl Into<String>,
        nodes: Vec<TaskNode>,
        initial_payloads: HashMap<String, AgentPayload>,
        agents: HashMap<String, TaskAgents>,
        options: RunOptions,
    ) -> Result<Self> {
        options.validate()?;

        let registry = DependencyRegistry::build(&nodes);
        registry.check_hallucinated_dependencies(&nodes)?;
        check_schemas(&nodes)?;
        let levels = compute_levels(&nodes)?;

        let mut depths = HashMap::new();
        for (depth, level) in levels.iter().enumerate() {
            for id in level {
                depths.insert(id.clone(), depth as u32);
            }
        }

        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for node in &nodes {
            for dep in &node.dependencies {
                dependents.entry(dep.clone()).or_default().push(node.id.clone());
            }
        }

        let mut records = HashMap::new();
        let node_map: HashMap<String, TaskNode> = nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        for id in node_map.keys() {
            records.insert(id.clone(), TaskRecord::pending());
        }

        let breaker = CircuitBreaker::new(BreakerConfig {
            failure_threshold: options.breaker_failure_threshold,
            open_timeout: std::time::Duration::from_secs(options.breaker_open_timeout_secs),
            success_threshold: options.breaker_success_threshold,
        });

        Ok(Self {
            run_id: run_id.into(),
            options,
            nodes: node_map,
            levels,
            depths,
            dependents,
            agents,
            initial_payloads,
            records: RwLock::new(records),
            breaker,
            verifier: StateVerifier::new(),
            sink: Arc::new(InMemorySink::default()),
            sequence: SequenceCounter::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
            completion_counter: Arc::new(AtomicU64::new(0)),
            sealed: RwLock::new(Vec::new()),
            guardrails: RwLock::new(Vec::new()),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        let records = self.records.read().await;
        let task_states = records.iter().map(|(id, r)| (id.clone(), r.status)).collect();
        RunSnapshot {
            task_states,
            breaker_states: self.breaker.all_snapshots().await,
        }
    }

    /// Drive the run to completion or irrecoverable failure.
    pub async fn run(&self) -> Result<RunResult> {
        for level in self.levels.clone() {
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(OrchestratorError::Cancelled { run_id: self.run_id.clone() });
            }

            let eligible = self.eligible_tasks(&level).await;
            let (serial, parallel): (Vec<_>, Vec<_>) = eligible
                .into_iter()
                .partition(|id| self.nodes[id].parallelization == ParallelizationHint::SerialRequired);

            for id in serial {
                self.dispatch_task(&id).await;
                if self.cancelled.load(Ordering::SeqCst) {
                    break;
                }
            }

            if !parallel.is_empty() {
                let permits = Arc::new(Semaphore::new(self.options.fan_out_limit));
                let mut handles = Vec::new();
                for id in parallel {
                    let permits = permits.clone();
                    let cancelled = self.cancelled.clone();
                    handles.push(async move {
                        let _permit = permits.acquire().await.expect("semaphore never closed");
                        if !cancelled.load(Ordering::SeqCst) {
                            self.dispatch_task(&id).await;
                        }
                    });
                }
                futures::future::join_all(handles).await;
            }
        }

        self.build_result().await
    }

    /// Tasks in `level` whose every dependency is in SUCCESS and which are
    /// not already terminal (e.g. ROLLED_BACK by an earlier rollback).
    async fn eligible_tasks(&self, level: &[String]) -> Vec<String> {
        let records = self.records.read().await;
        level
            .iter()
            .filter(|id| {
                let node = &self.nodes[*id];
                matches!(records[*id].status, TaskStatus::Pending)
                    && node.dependencies.iter().all(|dep| {
                        records.get(dep).map(|r| r.status == TaskStatus::Success).unwrap_or(false)
                    })
            })
            .cloned()
            .collect()
    }

    async fn dispatch_task(&self, task_id: &str) {
        loop {
            let node = &self.nodes[task_id];
            self.transition(task_id, TaskStatus::Ready).await;
            self.transition(task_id, TaskStatus::Running).await;

            let Some(agents) = self.agents.get(task_id) else {
                self.fail_and_rollback(task_id, OrchestratorError::Custom(format!(
                    "no agent bound to task '{task_id}'"
                )))
                .await;
                return;
            };

            let inputs = self.gather_inputs(node).await;
            let predecessor = self.choose_predecessor(node).await;
            let checkpoint_id = format!("{task_id}@{}", self.run_id);
            let depth = self.depths.get(task_id).copied().unwrap_or(0);

            let pctx = PipelineContext {
                breaker: &self.breaker,
                verifier: &self.verifier,
                options: &self.options,
                sink: self.sink.as_ref(),
                sequence: &self.sequence,
                run_id: &self.run_id,
            };

            let mut retry_events = Vec::new();
            let outcome = pipeline::execute_task(
                &pctx,
                node,
                &inputs,
                agents.primary.as_ref(),
                agents.adversary.as_deref(),
                depth,
                checkpoint_id,
                predecessor.map(|p| p.state_hash),
                |err, backoff_ms| retry_events.push((err.kind().to_string(), backoff_ms)),
            )
            .await;

            {
                let mut records = self.records.write().await;
                let record = records.get_mut(task_id).expect("task was registered at submit time");
                for (kind, backoff_ms) in retry_events {
                    record.record_retry(kind, backoff_ms);
                }
            }

            match outcome {
                Ok(result) => {
                    for kind in &result.guardrails {
                        self.guardrails.write().await.push((task_id.to_string(), *kind));
                    }

                    let order = self.completion_counter.fetch_add(1, Ordering::SeqCst);
                    self.sealed.write().await.push(SealedCheckpoint {
                        task_id: task_id.to_string(),
                        checkpoint_id: result.checkpoint.id.clone(),
                        state_hash: result.checkpoint.state_hash.clone(),
                        completion_order: order,
                    });

                    let mut records = self.records.write().await;
                    let record = records.get_mut(task_id).expect("task was registered at submit time");
                    record.checkpoint_id = Some(result.checkpoint.id.clone());
                    record.payload = Some(result.payload);
                    record.status = TaskStatus::Success;
                    drop(records);
                    self.emit_transition(task_id, "Running", "Success");
                    return;
                }
                Err(err) => {
                    if let Some(kind) = guardrail_for_error(&err) {
                        self.guardrails.write().await.push((task_id.to_string(), kind));
                        self.sink.emit(OrchestrationEvent::GuardrailActivated {
                            run_id: self.run_id.clone(),
                            seq: self.sequence.next(),
                            task_id: task_id.to_string(),
                            kind,
                        });
                    }
                    self.fail_and_rollback(task_id, err).await;

                    if self.idempotent_rerun_allowed(task_id).await {
                        continue;
                    }
                    return;
                }
            }
        }
    }

    /// A failed task with `idempotent` set may be re-run against the
    /// rolled-back state without user intervention, bounded by the same
    /// `max_retries` budget the pipeline's invoke loop uses.
    async fn idempotent_rerun_allowed(&self, task_id: &str) -> bool {
        let node = &self.nodes[task_id];
        if !node.idempotent {
            return false;
        }
        let mut records = self.records.write().await;
        let record = records.get_mut(task_id).expect("task was registered at submit time");
        if record.rerun_count >= node.max_retries {
            return false;
        }
        record.rerun_count += 1;
        record.status = TaskStatus::Pending;
        record.checkpoint_id = None;
        record.payload = None;
        record.last_error_kind = None;
        true
    }

    async fn gather_inputs(&self, node: &TaskNode) -> Vec<AgentPayload> {
        if node.dependencies.is_empty() {
            return self.initial_payloads.get(&node.id).cloned().into_iter().collect();
        }
        let records = self.records.read().await;
        node.dependencies
            .iter()
            .filter_map(|dep| records.get(dep).and_then(|r| r.payload.clone()))
            .collect()
    }

    /// Predecessor chaining by scheduler completion order, not wall-clock:
    /// among this task's dependencies' sealed checkpoints, pick the one
    /// with the highest completion order.
    async fn choose_predecessor(&self, node: &TaskNode) -> Option<SealedCheckpoint> {
        if node.dependencies.is_empty() {
            return None;
        }
        let sealed = self.sealed.read().await;
        let deps: HashSet<&str> = node.dependencies.iter().map(String::as_str).collect();
        let mut candidate: Option<&SealedCheckpoint> = None;
        for entry in sealed.iter() {
            if deps.contains(entry.task_id.as_str()) {
                match candidate {
                    Some(current) if current.completion_order >= entry.completion_order => {}
                    _ => candidate = Some(entry),
                }
            }
        }
        match candidate {
            None => None,
            Some(entry) => match self.verifier.get(&entry.checkpoint_id).await {
                Some(checkpoint) => {
                    match self.verifier.verify_checkpoint(&entry.checkpoint_id, &checkpoint.snapshot).await {
                        Ok(Verdict::Valid) => Some(entry.clone()),
                        Ok(Verdict::Expired) => {
                            self.sink.emit(OrchestrationEvent::GuardrailActivated {
                                run_id: self.run_id.clone(),
                                seq: self.sequence.next(),
                                task_id: entry.task_id.clone(),
                                kind: GuardrailKind::Desync,
                            });
                            self.guardrails
                                .write()
                                .await
                                .push((entry.task_id.clone(), GuardrailKind::Desync));
                            None
                        }
                        _ => None,
                    }
                }
                None => None,
            },
        }
    }

    /// Walk backward over sealed checkpoints in reverse completion order,
    /// stopping at the first one the verifier still calls VALID. Mark the
    /// failed task FAILED and every not-yet-run descendant ROLLED_BACK.
    async fn fail_and_rollback(&self, failed_task_id: &str, err: OrchestratorError) {
        {
            let mut records = self.records.write().await;
            let record = records.get_mut(failed_task_id).expect("task was registered at submit time");
            record.status = TaskStatus::Failed;
            record.last_error_kind = Some(err.kind().to_string());
        }
        self.emit_transition(failed_task_id, "Running", "Failed");

        let last_good = self.find_last_good_checkpoint().await;

        let descendants = self.descendants_of(failed_task_id);
        let mut records = self.records.write().await;
        let rolled_back: Vec<String> = descendants
            .into_iter()
            .filter(|id| {
                matches!(records.get(id).map(|r| r.status), Some(TaskStatus::Pending) | Some(TaskStatus::Ready))
            })
            .collect();
        for id in &rolled_back {
            if let Some(record) = records.get_mut(id) {
                record.status = TaskStatus::RolledBack;
                record.payload = None;
            }
        }
        drop(records);

        self.sink.emit(OrchestrationEvent::RollbackDecided {
            run_id: self.run_id.clone(),
            seq: self.sequence.next(),
            failed_task_id: failed_task_id.to_string(),
            last_good_checkpoint_id: last_good,
            rolled_back_task_ids: rolled_back,
        });
    }

    async fn find_last_good_checkpoint(&self) -> Option<String> {
        let sealed = self.sealed.read().await;
        for entry in sealed.iter().rev() {
            let Some(checkpoint) = self.verifier.get(&entry.checkpoint_id).await else { continue };
            if let Ok(Verdict::Valid) = self
                .verifier
                .verify_checkpoint(&entry.checkpoint_id, &checkpoint.snapshot)
                .await
            {
                return Some(entry.checkpoint_id.clone());
            }
        }
        None
    }

    fn descendants_of(&self, task_id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut stack = vec![task_id.to_string()];
        let mut result = Vec::new();
        while let Some(id) = stack.pop() {
            if let Some(children) = self.dependents.get(&id) {
                for child in children {
                    if seen.insert(child.clone()) {
                        result.push(child.clone());
                        stack.push(child.clone());
                    }
                }
            }
        }
        result
    }

    async fn build_result(&self) -> Result<RunResult> {
        let records = self.records.read().await;
        let task_states = records.iter().map(|(id, r)| (id.clone(), r.status)).collect();

        let confidences: Vec<f64> = records
            .values()
            .filter(|r| r.status == TaskStatus::Success)
            .filter_map(|r| r.payload.as_ref().map(|p| p.confidence))
            .collect();
        let confidence_stats = if confidences.is_empty() {
            ConfidenceStats::default()
        } else {
            let min = confidences.iter().cloned().fold(f64::INFINITY, f64::min);
            let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
            ConfidenceStats { min, mean }
        };

        let human_review_payloads = records
            .values()
            .filter_map(|r| r.payload.clone())
            .filter(|p| p.metadata.requires_human_review)
            .collect();

        drop(records);

        let sealed = self.sealed.read().await;
        let sealed_checkpoints = sealed.iter().map(|s| s.checkpoint_id.clone()).collect();
        drop(sealed);

        let last_good_checkpoint = self.find_last_good_checkpoint().await;

        Ok(RunResult {
            task_states,
            sealed_checkpoints,
            human_review_payloads,
            guardrail_activations: self.guardrails.read().await.clone(),
            last_good_checkpoint,
            confidence_stats,
        })
    }

    fn emit_transition(&self, task_id: &str, from: &str, to: &str) {
        self.sink.emit(OrchestrationEvent::TaskStateTransition {
            run_id: self.run_id.clone(),
            seq: self.sequence.next(),
            task_id: task_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    async fn transition(&self, task_id: &str, to: TaskStatus) {
        let from = {
            let mut records = self.records.write().await;
            let record = records.get_mut(task_id).expect("task was registered at submit time");
            let from = record.status;
            record.status = to;
            from
        };
        self.sink.emit(OrchestrationEvent::TaskStateTransition {
            run_id: self.run_id.clone(),
            seq: self.sequence.next(),
            task_id: task_id.to_string(),
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        });
    }
}

fn guardrail_for_error(err: &OrchestratorError) -> Option<GuardrailKind> {
    match err {
        OrchestratorError::ConfidenceCollapse { .. } => Some(GuardrailKind::ConfidenceCollapse),
        OrchestratorError::ToolPhantomSuccess { .. } => Some(GuardrailKind::PhantomSuccess),
        OrchestratorError::SycophancySuspected { .. } => Some(GuardrailKind::Sycophancy),
        OrchestratorError::HallucinatedDependency { .. } => Some(GuardrailKind::HallucinatedDependency),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::fakes::{EchoAgent, FlakyAgent, TamperingAgent};
    use crate::task::AgentRole;
    use serde_json::json;

    fn agents_for(id: &str, op_confidence: f64) -> HashMap<String, TaskAgents> {
        let mut map = HashMap::new();
        map.insert(
            id.to_string(),
            TaskAgents::new(Arc::new(EchoAgent::new(format!("agent-{id}"), op_confidence))),
        );
        map
    }

    #[tokio::test]
    async fn linear_chain_succeeds_and_chains_checkpoints() {
        let nodes = vec![
            TaskNode::new("t1", AgentRole::Generator),
            TaskNode::new("t2", AgentRole::Generator).with_dependencies(vec!["t1".into()]),
            TaskNode::new("t3", AgentRole::Generator).with_dependencies(vec!["t2".into()]),
        ];
        let mut agents = HashMap::new();
        for id in ["t1", "t2", "t3"] {
            agents.extend(agents_for(id, 0.95));
        }
        let mut initial = HashMap::new();
        initial.insert(
            "t1".to_string(),
            AgentPayload::seal("seed", "seed-agent", json!({"seed": true}), 1.0, vec![], "seed", true)
                .unwrap(),
        );

        let scheduler = Scheduler::submit("run-1", nodes, initial, agents, RunOptions::default()).unwrap();
        let result = scheduler.run().await.unwrap();

        assert_eq!(result.task_states["t1"], TaskStatus::Success);
        assert_eq!(result.task_states["t2"], TaskStatus::Success);
        assert_eq!(result.task_states["t3"], TaskStatus::Success);
        assert_eq!(result.sealed_checkpoints.len(), 3);
        // Matches the linear-chain scenario: out(T3) = 1.0 * 0.95^3 * (0.9^0 * 0.9^1 * 0.9^2).
        // Confidence only decreases along this chain, so it's also the run minimum.
        let expected_t3 = 0.95_f64.powi(3) * (1.0 * 0.9 * 0.81);
        assert!((result.confidence_stats.min - expected_t3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn fork_join_levels_b_and_c_before_d() {
        let nodes = vec![
            TaskNode::new("a", AgentRole::Generator),
            TaskNode::new("b", AgentRole::Generator).with_dependencies(vec!["a".into()]),
            TaskNode::new("c", AgentRole::Generator).with_dependencies(vec!["a".into()]),
            TaskNode::new("d", AgentRole::Generator).with_dependencies(vec!["b".into(), "c".into()]),
        ];
        let mut agents = HashMap::new();
        for id in ["a", "b", "c", "d"] {
            agents.extend(agents_for(id, 0.95));
        }
        let scheduler = Scheduler::submit("run-2", nodes, HashMap::new(), agents, RunOptions::default()).unwrap();
        let result = scheduler.run().await.unwrap();

        for id in ["a", "b", "c", "d"] {
            assert_eq!(result.task_states[id], TaskStatus::Success);
        }
        assert_eq!(result.sealed_checkpoints.len(), 4);
    }

    #[tokio::test]
    async fn integrity_violation_rolls_back_downstream_tasks() {
        let nodes = vec![
            TaskNode::new("t1", AgentRole::Generator),
            TaskNode::new("t2", AgentRole::Generator).with_dependencies(vec!["t1".into()]),
        ];
        let mut agents = HashMap::new();
        agents.insert("t1".to_string(), TaskAgents::new(Arc::new(TamperingAgent { id: "agent-t1".into() })));
        agents.insert("t2".to_string(), TaskAgents::new(Arc::new(EchoAgent::new("agent-t2", 0.9))));

        let scheduler = Scheduler::submit("run-3", nodes, HashMap::new(), agents, RunOptions::default()).unwrap();
        let result = scheduler.run().await.unwrap();

        assert_eq!(result.task_states["t1"], TaskStatus::Failed);
        assert_eq!(result.task_states["t2"], TaskStatus::RolledBack);
        assert!(result.sealed_checkpoints.is_empty());
        assert!(result.last_good_checkpoint.is_none());
    }

    #[tokio::test]
    async fn hallucinated_dependency_is_rejected_before_any_task_runs() {
        let nodes = vec![TaskNode::new("t1", AgentRole::Generator).with_dependencies(vec!["ghost".into()])];
        let err = Scheduler::submit("run-4", nodes, HashMap::new(), HashMap::new(), RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::HallucinatedDependency { .. }));
    }

    #[tokio::test]
    async fn idempotent_task_reruns_against_rolled_back_state_after_exhausting_retries() {
        let node = TaskNode::new("t1", AgentRole::Generator).with_idempotent(true);
        let flaky = Arc::new(FlakyAgent::new("agent-t1", 4));
        let mut agents = HashMap::new();
        agents.insert("t1".to_string(), TaskAgents::new(flaky.clone()));

        let scheduler = Scheduler::submit("run-6", vec![node], HashMap::new(), agents, RunOptions::default())
            .unwrap();
        let result = scheduler.run().await.unwrap();

        assert_eq!(result.task_states["t1"], TaskStatus::Success);
        assert_eq!(result.sealed_checkpoints.len(), 1);
        assert!(flaky.attempts() > 4, "expected the rerun to push past the first dispatch's retry budget");
    }

    #[tokio::test]
    async fn non_idempotent_task_stays_failed_without_rerun() {
        let node = TaskNode::new("t1", AgentRole::Generator);
        let flaky = Arc::new(FlakyAgent::new("agent-t1", 4));
        let mut agents = HashMap::new();
        agents.insert("t1".to_string(), TaskAgents::new(flaky));

        let scheduler = Scheduler::submit("run-7", vec![node], HashMap::new(), agents, RunOptions::default())
            .unwrap();
        let result = scheduler.run().await.unwrap();

        assert_eq!(result.task_states["t1"], TaskStatus::Failed);
        assert!(result.sealed_checkpoints.is_empty());
    }

    #[tokio::test]
    async fn schema_rejected_is_rejected_before_any_task_runs() {
        let mut node = TaskNode::new("t1", AgentRole::Generator);
        node.input_schema = json!({"pattern": "[unterminated"});
        let err = Scheduler::submit("run-8", vec![node], HashMap::new(), HashMap::new(), RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::SchemaRejected { .. }));
    }

    #[tokio::test]
    async fn cycle_is_rejected_before_any_task_runs() {
        let nodes = vec![
            TaskNode::new("a", AgentRole::Worker).with_dependencies(vec!["b".into()]),
            TaskNode::new("b", AgentRole::Worker).with_dependencies(vec!["a".into()]),
        ];
        let err = Scheduler::submit("run-5", nodes, HashMap::new(), HashMap::new(), RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::CircularDependency { .. }));
    }
}
