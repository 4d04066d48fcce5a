//! Shared fake agents for end-to-end scenario tests.
//!
//! `warden_core::agent::fakes` only compiles under the crate's own unit
//! tests (`cfg(test)`), so integration tests under this directory keep a
//! small set of their own.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

use warden_core::agent::AgentExecutor;
use warden_core::error::{OrchestratorError, Result};
use warden_core::payload::AgentPayload;

/// Always succeeds with a fixed operation confidence.
pub struct EchoAgent {
    pub id: String,
    pub op_confidence: f64,
}

impl EchoAgent {
    pub fn new(id: impl Into<String>, op_confidence: f64) -> Self {
        Self { id: id.into(), op_confidence }
    }
}

#[async_trait]
impl AgentExecutor for EchoAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, inputs: &[AgentPayload], _deadline: Instant) -> Result<AgentPayload> {
        let upstream_ids = inputs.iter().map(|p| p.task_id.clone()).collect();
        AgentPayload::seal(
            "pending",
            &self.id,
            json!({"agent": self.id}),
            self.op_confidence,
            upstream_ids,
            "deterministic fake output",
            true,
        )
    }
}

/// Fails every call; grounds the breaker-opens scenario.
pub struct AlwaysFailsAgent {
    pub id: String,
}

#[async_trait]
impl AgentExecutor for AlwaysFailsAgent {
    fn agent_id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, _inputs: &[AgentPayload], _deadline: Instant) -> Result<AgentPayload> {
        Err(OrchestratorError::AgentTransient {
            task_id: "pending".into(),
            agent_id: self.id.clone(),
            reason: "scenario agent always fails".into(),
        })
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
        let mut payload = AgentPayload::seal("pending", &self.id, json!({"v": 1}), 0.9, vec![], "", true)?;
        payload.body = json!({"v": 2});
        Ok(payload)
    }
}

/// An adversary that parrots the primary with an empty reasoning trace, to
/// trigger SYCOPHANCY_SUSPECTED.
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

pub fn arc_agent<A: AgentExecutor + 'static>(agent: A) -> Arc<dyn AgentExecutor> {
    Arc::new(agent)
}
