//! The agent execution pipeline: the eight steps that turn a dispatched task
//! plus its upstream payloads into a sealed, confidence-scored result.
//!
//! Task-state transitions and retry bookkeeping stay the scheduler's job
//! (`crate::task::TaskRecord` is never touched from here); this module
//! reports what happened through its return value and the `on_retry`
//! callback, and the scheduler decides what to do with it.

use std::collections::HashSet;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::agent::AgentExecutor;
use crate::breaker::CircuitBreaker;
use crate::error::{OrchestratorError, Result};
use crate::events::{EventSink, GuardrailKind, OrchestrationEvent, SequenceCounter};
use crate::options::RunOptions;
use crate::payload::AgentPayload;
use crate::task::TaskNode;
use warden_checkpoint::{Checkpoint, StateVerifier};

/// Everything a single pipeline run needs that outlives the call and is
/// shared across the whole orchestration run.
pub struct PipelineContext<'a> {
    pub breaker: &'a CircuitBreaker,
    pub verifier: &'a StateVerifier,
    pub options: &'a RunOptions,
    pub sink: &'a dyn EventSink,
    pub sequence: &'a SequenceCounter,
    pub run_id: &'a str,
}

/// The result of successfully driving one task through the pipeline.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub payload: AgentPayload,
    pub confidence: f64,
    pub checkpoint: Checkpoint,
    pub guardrails: Vec<GuardrailKind>,
}

/// Weight adversarial cross-check gives to flagged-risk count versus
/// semantic disagreement, and the count above which additional flagged
/// risks stop increasing the score.
const RISK_WEIGHT: f64 = 0.3;
const SEMANTIC_WEIGHT: f64 = 0.7;
const RISK_CEILING: f64 = 3.0;

/// Drive `task` through all eight pipeline steps against `agent`, using
/// `inputs` as the gathered upstream payloads.
///
/// `chain_depth` is the longest root-to-task path length, used for the
/// confidence decay term. `checkpoint_id` and `predecessor_checkpoint_hash`
/// are supplied by the scheduler, which owns id allocation and chains each
/// task to whichever dependency's checkpoint sealed most recently.
/// `on_retry` is invoked once per retried attempt so the
/// scheduler can append to the task's retry history without this module
/// reaching into `TaskRecord`.
#[allow(clippy::too_many_arguments)]
pub async fn execute_task(
    ctx: &PipelineContext<'_>,
    task: &TaskNode,
    inputs: &[AgentPayload],
    agent: &dyn AgentExecutor,
    adversary: Option<&dyn AgentExecutor>,
    chain_depth: u32,
    checkpoint_id: impl Into<String>,
    predecessor_checkpoint_hash: Option<String>,
    mut on_retry: impl FnMut(&OrchestratorError, u64),
) -> Result<PipelineOutcome> {
    let _guard = warden_tooling::logging::LogGuard::new(format!("execute_task:{}", task.id));

    check_input_integrity(task, inputs)?;

    let mut payload = warden_tooling::logging::timed(
        &format!("invoke:{}", task.id),
        invoke_with_retry(ctx, task, inputs, agent, &mut on_retry),
    )
    .await?;

    tracing::debug!(
        task_id = %task.id,
        reasoning = %warden_tooling::logging::sanitize_for_logging(&payload.reasoning_trace),
        "agent invocation produced a payload"
    );

    validate_output(task, &payload)?;
    reseal_output(task, &payload)?;

    let confidence = propagate_confidence(ctx.options, task, inputs, &payload, chain_depth)?;
    payload.confidence = confidence;

    let mut guardrails = Vec::new();
    if task.high_stakes {
        if let Some(adversary) = adversary {
            run_adversarial_cross_check(ctx, task, &mut payload, adversary, &mut guardrails).await?;
        }
    }

    let checkpoint = seal_checkpoint(ctx, task, checkpoint_id, &payload, predecessor_checkpoint_hash)
        .await?;

    Ok(PipelineOutcome {
        payload,
        confidence,
        checkpoint,
        guardrails,
    })
}

/// Step 1: recompute each upstream payload's hash and compare with what it
/// was sealed with. Phantom-input protection — any mismatch fails
/// immediately, no retry.
fn check_input_integrity(task: &TaskNode, inputs: &[AgentPayload]) -> Result<()> {
    for payload in inputs {
        if !payload.verify_integrity()? {
            return Err(OrchestratorError::IntegrityViolation {
                task_id: task.id.clone(),
                expected: payload.content_hash.clone(),
                actual: warden_checkpoint::content_hash(&payload.body)?,
            });
        }
    }
    Ok(())
}

/// Steps 2-3: per-attempt breaker admission, invocation under a deadline,
/// and exponential backoff between retryable failures.
async fn invoke_with_retry(
    ctx: &PipelineContext<'_>,
    task: &TaskNode,
    inputs: &[AgentPayload],
    agent: &dyn AgentExecutor,
    on_retry: &mut impl FnMut(&OrchestratorError, u64),
) -> Result<AgentPayload> {
    let agent_id = agent.agent_id().to_string();
    let max_attempts = task.max_retries + 1;

    for attempt in 0..max_attempts {
        let before_mode = ctx.breaker.snapshot(&agent_id).await.map(|s| s.mode);
        let timeout = Duration::from_millis(task.timeout_ms);
        let deadline = Instant::now() + timeout;

        let outcome = ctx
            .breaker
            .call_through(&task.id, &agent_id, || async {
                match tokio::time::timeout(timeout, agent.invoke(inputs, deadline)).await {
                    Ok(result) => result,
                    Err(_) => Err(OrchestratorError::AgentTimeout {
                        task_id: task.id.clone(),
                        agent_id: agent_id.clone(),
                    }),
                }
            })
            .await;

        if let Some(after) = ctx.breaker.snapshot(&agent_id).await {
            if Some(after.mode) != before_mode {
                ctx.sink.emit(OrchestrationEvent::BreakerTransition {
                    run_id: ctx.run_id.to_string(),
                    seq: ctx.sequence.next(),
                    agent_id: agent_id.clone(),
                    to: after.mode,
                });
            }
        }

        match outcome {
            Ok(payload) => return Ok(payload),
            Err(err) => {
                let last_attempt = attempt + 1 >= max_attempts;
                if !err.is_retryable() || last_attempt {
                    return Err(err);
                }
                let backoff_secs = ctx
                    .options
                    .backoff_schedule_secs
                    .get(attempt as usize)
                    .or_else(|| ctx.options.backoff_schedule_secs.last())
                    .copied()
                    .unwrap_or(0);
                on_retry(&err, backoff_secs * 1000);
                if backoff_secs > 0 {
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                }
            }
        }
    }
    unreachable!("loop always returns within max_attempts iterations")
}

/// Step 4: an explicit success indicator is mandatory; its absence is the
/// phantom-success guardrail. Output schema, when declared, must validate.
fn validate_output(task: &TaskNode, payload: &AgentPayload) -> Result<()> {
    if !payload.success {
        return Err(OrchestratorError::ToolPhantomSuccess {
            task_id: task.id.clone(),
            agent_id: payload.producing_agent_id.clone(),
        });
    }
    validate_against_schema(&task.output_schema, &payload.body)
        .map_err(|reason| OrchestratorError::SchemaViolation {
            task_id: task.id.clone(),
            reason,
        })
}

/// `Value::Null` means "no schema declared" and always validates.
fn validate_against_schema(schema: &Value, instance: &Value) -> std::result::Result<(), String> {
    if schema.is_null() {
        return Ok(());
    }
    let compiled = jsonschema::JSONSchema::compile(schema)
        .map_err(|e| format!("invalid output schema: {e}"))?;
    compiled.validate(instance).map_err(|errors| {
        errors
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    })
}

/// Step 5: re-affirm the payload's own seal. An agent that mutates its body
/// after sealing (accidentally or adversarially) is caught here rather than
/// left for the next consumer.
fn reseal_output(task: &TaskNode, payload: &AgentPayload) -> Result<()> {
    if !payload.verify_integrity()? {
        return Err(OrchestratorError::IntegrityViolation {
            task_id: task.id.clone(),
            expected: payload.content_hash.clone(),
            actual: warden_checkpoint::content_hash(&payload.body)?,
        });
    }
    Ok(())
}

/// Step 6: outgoing confidence is the minimum upstream confidence times the
/// agent's own reported operation confidence times a decay term. A result
/// under the floor, or a chain already past the depth cap, collapses the
/// chain.
fn propagate_confidence(
    options: &RunOptions,
    task: &TaskNode,
    inputs: &[AgentPayload],
    payload: &AgentPayload,
    chain_depth: u32,
) -> Result<f64> {
    let input_confidence = inputs
        .iter()
        .map(|p| p.confidence)
        .fold(f64::INFINITY, f64::min);
    let input_confidence = if input_confidence.is_finite() { input_confidence } else { 1.0 };
    let op_confidence = payload.confidence;
    let decay = options.depth_decay_base.powi(chain_depth as i32);
    let outgoing = input_confidence * op_confidence * decay;

    if outgoing < options.confidence_floor || chain_depth > options.chain_depth_cap {
        return Err(OrchestratorError::ConfidenceCollapse {
            task_id: task.id.clone(),
            confidence: outgoing,
        });
    }
    Ok(outgoing)
}

/// Step 7: dispatch an independent adversary against the primary's output.
///
/// Disagreement score: `0.7 * (1 - jaccard token overlap of the two
/// canonical-JSON bodies) + 0.3 * (flagged-risk count / 3, capped at 1)`.
/// Token-level Jaccard distance stands in for semantic overlap without
/// needing an embedding model, and the adversary's `considered_alternatives`
/// list doubles as its flagged risks.
async fn run_adversarial_cross_check(
    ctx: &PipelineContext<'_>,
    task: &TaskNode,
    payload: &mut AgentPayload,
    adversary: &dyn AgentExecutor,
    guardrails: &mut Vec<GuardrailKind>,
) -> Result<()> {
    let deadline = Instant::now() + Duration::from_millis(task.timeout_ms);
    let adversarial_payload = adversary.invoke(std::slice::from_ref(payload), deadline).await?;

    let score = disagreement_score(payload, &adversarial_payload);
    let null_adversary = adversarial_payload.reasoning_trace.trim().is_empty();

    if null_adversary && score <= ctx.options.sycophancy_threshold {
        return Err(OrchestratorError::SycophancySuspected {
            task_id: task.id.clone(),
        });
    }

    if score > ctx.options.sycophancy_threshold {
        payload.metadata.requires_human_review = true;
        guardrails.push(GuardrailKind::Sycophancy);
        ctx.sink.emit(OrchestrationEvent::GuardrailActivated {
            run_id: ctx.run_id.to_string(),
            seq: ctx.sequence.next(),
            task_id: task.id.clone(),
            kind: GuardrailKind::Sycophancy,
        });
    }
    Ok(())
}

fn disagreement_score(primary: &AgentPayload, adversary: &AgentPayload) -> f64 {
    let semantic_disagreement = 1.0 - jaccard_overlap(&primary.body, &adversary.body);
    let risk_component = (adversary.considered_alternatives.len() as f64 / RISK_CEILING).min(1.0);
    (SEMANTIC_WEIGHT * semantic_disagreement + RISK_WEIGHT * risk_component).clamp(0.0, 1.0)
}

fn jaccard_overlap(a: &Value, b: &Value) -> f64 {
    let ta = tokenize(a);
    let tb = tokenize(b);
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    let intersection = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    if union == 0.0 {
        1.0
    } else {
        intersection / union
    }
}

fn tokenize(value: &Value) -> HashSet<String> {
    value
        .to_string()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Step 8: seal the produced payload as a checkpoint, chained to the
/// predecessor the scheduler determined by completion order.
async fn seal_checkpoint(
    ctx: &PipelineContext<'_>,
    task: &TaskNode,
    checkpoint_id: impl Into<String>,
    payload: &AgentPayload,
    predecessor_checkpoint_hash: Option<String>,
) -> Result<Checkpoint> {
    let checkpoint_id = checkpoint_id.into();
    let snapshot = serde_json::to_value(payload)
        .map_err(|e| OrchestratorError::Custom(format!("failed to snapshot payload: {e}")))?;
    let checkpoint = ctx
        .verifier
        .create_checkpoint(
            checkpoint_id.clone(),
            snapshot,
            Some(ctx.options.default_ttl_secs),
            predecessor_checkpoint_hash,
        )
        .await?;

    ctx.sink.emit(OrchestrationEvent::CheckpointCreated {
        run_id: ctx.run_id.to_string(),
        seq: ctx.sequence.next(),
        task_id: task.id.clone(),
        checkpoint_id: checkpoint.id.clone(),
        state_hash: checkpoint.state_hash.clone(),
    });
    Ok(checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::fakes::{EchoAgent, FlakyAgent, NullAdversary, PhantomSuccessAgent, TamperingAgent};
    use crate::events::InMemorySink;
    use crate::task::AgentRole;

    fn ctx<'a>(
        breaker: &'a CircuitBreaker,
        verifier: &'a StateVerifier,
        options: &'a RunOptions,
        sink: &'a InMemorySink,
        sequence: &'a SequenceCounter,
    ) -> PipelineContext<'a> {
        PipelineContext {
            breaker,
            verifier,
            options,
            sink,
            sequence,
            run_id: "run-1",
        }
    }

    #[tokio::test]
    async fn successful_echo_seals_a_checkpoint_and_decays_confidence() {
        let breaker = CircuitBreaker::default();
        let verifier = StateVerifier::new();
        let options = RunOptions::default();
        let sink = InMemorySink::default();
        let sequence = SequenceCounter::default();
        let pctx = ctx(&breaker, &verifier, &options, &sink, &sequence);

        let task = TaskNode::new("t1", AgentRole::Generator);
        let agent = EchoAgent::new("agent-a", 0.95);

        let outcome = execute_task(&pctx, &task, &[], &agent, None, 0, "cp-t1", None, |_, _| {})
            .await
            .unwrap();

        assert_eq!(outcome.confidence, 0.95);
        assert_eq!(outcome.checkpoint.id, "cp-t1");
        assert!(sink.events().iter().any(|e| matches!(e, OrchestrationEvent::CheckpointCreated { .. })));
    }

    #[tokio::test]
    async fn flaky_agent_recovers_within_retry_budget() {
        let breaker = CircuitBreaker::default();
        let verifier = StateVerifier::new();
        let mut options = RunOptions::default();
        options.backoff_schedule_secs = vec![0, 0, 0];
        let sink = InMemorySink::default();
        let sequence = SequenceCounter::default();
        let pctx = ctx(&breaker, &verifier, &options, &sink, &sequence);

        let task = TaskNode::new("t1", AgentRole::Worker).with_max_retries(3);
        let agent = FlakyAgent::new("agent-b", 2);

        let mut retries_seen = 0u32;
        let outcome = execute_task(&pctx, &task, &[], &agent, None, 0, "cp-t1", None, |_, _| {
            retries_seen += 1;
        })
        .await
        .unwrap();

        assert_eq!(retries_seen, 2);
        assert_eq!(agent.attempts(), 3);
        assert!(outcome.payload.success);
    }

    #[tokio::test]
    async fn exhausting_retries_returns_the_final_error() {
        let breaker = CircuitBreaker::default();
        let verifier = StateVerifier::new();
        let mut options = RunOptions::default();
        options.backoff_schedule_secs = vec![0];
        let sink = InMemorySink::default();
        let sequence = SequenceCounter::default();
        let pctx = ctx(&breaker, &verifier, &options, &sink, &sequence);

        let task = TaskNode::new("t1", AgentRole::Worker).with_max_retries(1);
        let agent = FlakyAgent::new("agent-c", 5);

        let err = execute_task(&pctx, &task, &[], &agent, None, 0, "cp-t1", None, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::AgentTransient { .. }));
    }

    #[tokio::test]
    async fn tampered_output_fails_integrity_at_reseal() {
        let breaker = CircuitBreaker::default();
        let verifier = StateVerifier::new();
        let options = RunOptions::default();
        let sink = InMemorySink::default();
        let sequence = SequenceCounter::default();
        let pctx = ctx(&breaker, &verifier, &options, &sink, &sequence);

        let task = TaskNode::new("t1", AgentRole::Worker);
        let agent = TamperingAgent { id: "agent-d".into() };

        let err = execute_task(&pctx, &task, &[], &agent, None, 0, "cp-t1", None, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::IntegrityViolation { .. }));
    }

    #[tokio::test]
    async fn phantom_success_is_rejected() {
        let breaker = CircuitBreaker::default();
        let verifier = StateVerifier::new();
        let options = RunOptions::default();
        let sink = InMemorySink::default();
        let sequence = SequenceCounter::default();
        let pctx = ctx(&breaker, &verifier, &options, &sink, &sequence);

        let task = TaskNode::new("t1", AgentRole::Worker);
        let agent = PhantomSuccessAgent { id: "agent-e".into() };

        let err = execute_task(&pctx, &task, &[], &agent, None, 0, "cp-t1", None, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ToolPhantomSuccess { .. }));
    }

    #[tokio::test]
    async fn low_operation_confidence_collapses_the_chain() {
        let breaker = CircuitBreaker::default();
        let verifier = StateVerifier::new();
        let options = RunOptions::default();
        let sink = InMemorySink::default();
        let sequence = SequenceCounter::default();
        let pctx = ctx(&breaker, &verifier, &options, &sink, &sequence);

        let task = TaskNode::new("t1", AgentRole::Worker);
        let agent = EchoAgent::new("agent-f", 0.1);

        let err = execute_task(&pctx, &task, &[], &agent, None, 0, "cp-t1", None, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ConfidenceCollapse { .. }));
        assert_eq!(verifier.len().await, 0);
    }

    #[tokio::test]
    async fn null_adversary_triggers_sycophancy_suspected() {
        let breaker = CircuitBreaker::default();
        let verifier = StateVerifier::new();
        let options = RunOptions::default();
        let sink = InMemorySink::default();
        let sequence = SequenceCounter::default();
        let pctx = ctx(&breaker, &verifier, &options, &sink, &sequence);

        let task = TaskNode::new("t1", AgentRole::Generator).with_high_stakes(true);
        let agent = EchoAgent::new("agent-g", 0.95);
        let adversary = NullAdversary { id: "agent-h".into() };

        let err = execute_task(&pctx, &task, &[], &agent, Some(&adversary), 0, "cp-t1", None, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::SycophancySuspected { .. }));
    }

    #[tokio::test]
    async fn open_breaker_rejects_without_invoking_agent() {
        let breaker = CircuitBreaker::default();
        breaker.admit("t1", "agent-i").await.unwrap();
        for _ in 0..5 {
            breaker.record_outcome("agent-i", false).await;
        }
        let verifier = StateVerifier::new();
        let options = RunOptions::default();
        let sink = InMemorySink::default();
        let sequence = SequenceCounter::default();
        let pctx = ctx(&breaker, &verifier, &options, &sink, &sequence);

        let task = TaskNode::new("t1", AgentRole::Worker);
        let agent = EchoAgent::new("agent-i", 0.95);

        let err = execute_task(&pctx, &task, &[], &agent, None, 0, "cp-t1", None, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::BreakerOpen { .. }));
    }
}
