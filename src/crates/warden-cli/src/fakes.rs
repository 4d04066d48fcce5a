//! Deterministic in-process agents backing the bundled demo scenarios.
//!
//! These mirror `warden_core::agent::fakes`, which only compiles under that
//! crate's own unit tests — a CLI binary links the library normally, so it
//! keeps its own small set.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::Instant;

use warden_core::agent::AgentExecutor;
use warden_core::error::{OrchestratorError, Result};
use warden_core::payload::AgentPayload;

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
            "deterministic demo output",
            true,
        )
    }
}

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
            reason: "demo scenario agent always fails".into(),
        })
    }
}

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
