//! The agent invocation contract.
//!
//! An agent is an opaque computation — the core does not discriminate
//! between one backed by an AI provider, an HTTP client, or an in-process
//! computation. All it promises is this trait.

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::Result;
use crate::payload::AgentPayload;

/// `invoke(input_payload_set, deadline) -> agent_payload`.
///
/// Implementers must return a payload whose declared upstream ids match the
/// inputs, whose body validates against the declared output schema, and
/// which sets an explicit boolean success indicator. Any deviation is
/// caught by the pipeline and reported as a typed failure.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    fn agent_id(&self) -> &str;

    async fn invoke(&self, inputs: &[AgentPayload], deadline: Instant) -> Result<AgentPayload>;
}

#[cfg(test)]
pub mod fakes {
    //! Deterministic fake agents for pipeline and scheduler tests. Kept
    //! alongside the trait so both this crate's unit tests and its
    //! integration tests under `tests/` can build scenarios from the same
    //! small set of building blocks.

    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Always succeeds with a fixed operation confidence.
    pub struct EchoAgent {
        pub id: String,
        pub op_confidence: f64,
        pub reasoning_trace: String,
    }

    impl EchoAgent {
        pub fn new(id: impl Into<String>, op_confidence: f64) -> Self {
            Self {
                id: id.into(),
                op_confidence,
                reasoning_trace: "deterministic fake output".to_string(),
            }
        }
    }

    #[async_trait]
    impl AgentExecutor for EchoAgent {
        fn agent_id(&self) -> &str {
            &self.id
        }

        async fn invoke(&self, inputs: &[AgentPayload], _deadline: Instant) -> Result<AgentPayload> {
            let upstream_ids = inputs.iter().map(|p| p.task_id.clone()).collect();
            let body: Value = json!({"agent": self.id, "op_confidence": self.op_confidence});
            let mut payload = AgentPayload::seal(
                "pending",
                &self.id,
                body,
                self.op_confidence,
                upstream_ids,
                self.reasoning_trace.clone(),
                true,
            )?;
            payload.metadata.extra = json!({"op_confidence": self.op_confidence});
            Ok(payload)
        }
    }

    /// Fails `fail_count` times, then succeeds. Grounds the retry-with-backoff tests.
    pub struct FlakyAgent {
        pub id: String,
        pub fail_count: usize,
        attempts: Arc<AtomicUsize>,
    }

    impl FlakyAgent {
        pub fn new(id: impl Into<String>, fail_count: usize) -> Self {
            Self {
                id: id.into(),
                fail_count,
                attempts: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AgentExecutor for FlakyAgent {
        fn agent_id(&self) -> &str {
            &self.id
        }

        async fn invoke(&self, _inputs: &[AgentPayload], _deadline: Instant) -> Result<AgentPayload> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_count {
                return Err(crate::error::OrchestratorError::AgentTransient {
                    task_id: "pending".into(),
                    agent_id: self.id.clone(),
                    reason: format!("simulated failure {}/{}", attempt + 1, self.fail_count),
                });
            }
            AgentPayload::seal(
                "pending",
                &self.id,
                json!({"recovered_after": attempt}),
                0.9,
                vec![],
                "recovered",
                true,
            )
        }
    }

    /// Returns a payload with a tampered hash, to trigger INTEGRITY_VIOLATION.
    pub struct TamperingAgent {
        pub id: String,
    }

    #[async_trait]
    impl AgentExecutor for TamperingAgent {
        fn agent_id(&self) -> &str {
            &self.id
        }

        async fn invoke(&self, _inputs: &[AgentPayload], _deadline: Instant) -> Result<AgentPayload> {
            let mut payload =
                AgentPayload::seal("pending", &self.id, json!({"v": 1}), 0.9, vec![], "", true)?;
            payload.body = json!({"v": 2});
            Ok(payload)
        }
    }

    /// Returns `success = false`, to trigger TOOL_PHANTOM_SUCCESS.
    pub struct PhantomSuccessAgent {
        pub id: String,
    }

    #[async_trait]
    impl AgentExecutor for PhantomSuccessAgent {
        fn agent_id(&self) -> &str {
            &self.id
        }

        async fn invoke(&self, _inputs: &[AgentPayload], _deadline: Instant) -> Result<AgentPayload> {
            AgentPayload::seal("pending", &self.id, json!({"partial": true}), 0.9, vec![], "", false)
        }
    }

    /// An adversary that parrots the primary with an empty reasoning trace,
    /// to trigger SYCOPHANCY_SUSPECTED.
    pub struct NullAdversary {
        pub id: String,
    }

    #[async_trait]
    impl AgentExecutor for NullAdversary {
        fn agent_id(&self) -> &str {
            &self.id
        }

        async fn invoke(&self, inputs: &[AgentPayload], _deadline: Instant) -> Result<AgentPayload> {
            let body = inputs.first().map(|p| p.body.clone()).unwrap_or(Value::Null);
            AgentPayload::seal("pending", &self.id, body, 0.9, vec![], "", true)
        }
    }
}
