//! Observability events emitted to a caller-provided sink.
//!
//! Logging (via `tracing`) is for operators tailing output; this module is
//! for programmatic observability consumers who want typed values, not log
//! lines to parse. Every event carries the run id, task id (when
//! applicable), and a monotonic per-run sequence number.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::breaker::BreakerMode;

/// One of the five behavioral guardrails the pipeline enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardrailKind {
    Sycophancy,
    Desync,
    HallucinatedDependency,
    ConfidenceCollapse,
    PhantomSuccess,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrchestrationEvent {
    TaskStateTransition {
        run_id: String,
        seq: u64,
        task_id: String,
        from: String,
        to: String,
    },
    CheckpointCreated {
        run_id: String,
        seq: u64,
        task_id: String,
        checkpoint_id: String,
        state_hash: String,
    },
    GuardrailActivated {
        run_id: String,
        seq: u64,
        task_id: String,
        kind: GuardrailKind,
    },
    BreakerTransition {
        run_id: String,
        seq: u64,
        agent_id: String,
        to: BreakerMode,
    },
    RollbackDecided {
        run_id: String,
        seq: u64,
        failed_task_id: String,
        last_good_checkpoint_id: Option<String>,
        rolled_back_task_ids: Vec<String>,
    },
}

/// Where a run sends its events. The default sink keeps them in memory for
/// inspection; callers needing a real sink (metrics, a message bus)
/// implement this trait themselves.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OrchestrationEvent);
}

/// In-memory sink: collects every event it is handed, in arrival order.
#[derive(Default)]
pub struct InMemorySink {
    events: std::sync::Mutex<Vec<OrchestrationEvent>>,
}

impl EventSink for InMemorySink {
    fn emit(&self, event: OrchestrationEvent) {
        self.events.lock().expect("event sink mutex poisoned").push(event);
    }
}

impl InMemorySink {
    pub fn events(&self) -> Vec<OrchestrationEvent> {
        self.events.lock().expect("event sink mutex poisoned").clone()
    }
}

/// Per-run monotonic sequence number generator, shared across concurrently
/// executing tasks within one level.
#[derive(Clone, Default)]
pub struct SequenceCounter {
    next: Arc<AtomicU64>,
}

impl SequenceCounter {
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
