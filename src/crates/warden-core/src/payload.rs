//! The agent payload: the typed message a completed agent emits, hash-sealed
//! and confidence-scored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use warden_checkpoint::content_hash;

use crate::error::{OrchestratorError, Result};

/// A declared assumption an agent made while producing its payload, each
/// carrying its own confidence so a consumer can tell "I assumed X at 0.6"
/// apart from "I computed X at 0.95".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assumption {
    pub statement: String,
    pub confidence: f64,
}

/// Metadata flags an agent or the pipeline attaches to a payload without
/// touching its body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PayloadMetadata {
    #[serde(default)]
    pub requires_human_review: bool,
    #[serde(default)]
    pub extra: Value,
}

/// The inter-component message passed between the scheduler, the pipeline,
/// and consuming tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPayload {
    pub task_id: String,
    pub producing_agent_id: String,
    pub created_at: DateTime<Utc>,
    pub body: Value,
    pub content_hash: String,
    pub confidence: f64,
    pub consumed_upstream_ids: Vec<String>,
    pub reasoning_trace: String,
    pub assumptions: Vec<Assumption>,
    pub considered_alternatives: Vec<String>,
    pub metadata: PayloadMetadata,
    /// Explicit success indicator the agent must set; a missing or false
    /// value here is the phantom-success guardrail's trigger.
    pub success: bool,
}

impl AgentPayload {
    /// Seal a new payload, computing its content hash over `body` now.
    pub fn seal(
        task_id: impl Into<String>,
        producing_agent_id: impl Into<String>,
        body: Value,
        confidence: f64,
        consumed_upstream_ids: Vec<String>,
        reasoning_trace: impl Into<String>,
        success: bool,
    ) -> Result<Self> {
        let content_hash = content_hash(&body)?;
        Ok(Self {
            task_id: task_id.into(),
            producing_agent_id: producing_agent_id.into(),
            created_at: Utc::now(),
            body,
            content_hash,
            confidence,
            consumed_upstream_ids,
            reasoning_trace: reasoning_trace.into(),
            assumptions: Vec::new(),
            considered_alternatives: Vec::new(),
            metadata: PayloadMetadata::default(),
            success,
        })
    }

    /// Recompute the canonical hash of `body` and compare it with the
    /// stored `content_hash`.
    pub fn verify_integrity(&self) -> Result<bool> {
        Ok(content_hash(&self.body)? == self.content_hash)
    }

    pub fn confidence_in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }

    /// `dependencies` must be a subset of the task's declared upstream ids.
    pub fn dependencies_are_subset_of(&self, declared_upstream: &[String]) -> bool {
        self.consumed_upstream_ids
            .iter()
            .all(|id| declared_upstream.contains(id))
    }

    pub fn assert_valid(&self, declared_upstream: &[String]) -> Result<()> {
        if !self.verify_integrity()? {
            return Err(OrchestratorError::IntegrityViolation {
                task_id: self.task_id.clone(),
                expected: self.content_hash.clone(),
                actual: content_hash(&self.body)?,
            });
        }
        if !self.confidence_in_range() {
            return Err(OrchestratorError::Custom(format!(
                "confidence {} out of [0,1] for task '{}'",
                self.confidence, self.task_id
            )));
        }
        if !self.dependencies_are_subset_of(declared_upstream) {
            return Err(OrchestratorError::Custom(format!(
                "payload for task '{}' consumed ids outside its declared upstream",
                self.task_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seal_and_verify_roundtrip() {
        let payload = AgentPayload::seal(
            "t1",
            "agent-a",
            json!({"result": 42}),
            0.9,
            vec![],
            "computed directly",
            true,
        )
        .unwrap();
        assert!(payload.verify_integrity().unwrap());
    }

    #[test]
    fn tampered_body_fails_integrity() {
        let mut payload =
            AgentPayload::seal("t1", "agent-a", json!({"result": 42}), 0.9, vec![], "", true).unwrap();
        payload.body = json!({"result": 43});
        assert!(!payload.verify_integrity().unwrap());
    }

    #[test]
    fn out_of_range_confidence_is_invalid() {
        let payload =
            AgentPayload::seal("t1", "agent-a", json!({}), 1.5, vec![], "", true).unwrap();
        assert!(!payload.confidence_in_range());
    }

    #[test]
    fn dependencies_must_be_subset_of_declared_upstream() {
        let payload = AgentPayload::seal(
            "t2",
            "agent-b",
            json!({}),
            0.8,
            vec!["t1".into(), "ghost".into()],
            "",
            true,
        )
        .unwrap();
        assert!(!payload.dependencies_are_subset_of(&["t1".to_string()]));
        assert!(payload.dependencies_are_subset_of(&["t1".to_string(), "ghost".to_string()]));
    }

    #[test]
    fn assert_valid_flags_integrity_violation() {
        let mut payload =
            AgentPayload::seal("t1", "agent-a", json!({"x": 1}), 0.9, vec![], "", true).unwrap();
        payload.body = json!({"x": 2});
        let err = payload.assert_valid(&[]).unwrap_err();
        assert!(matches!(err, OrchestratorError::IntegrityViolation { .. }));
    }
}
