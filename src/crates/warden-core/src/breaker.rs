//! Per-agent circuit breaker: a three-state admission-control gate.
//!
//! The breaker itself does no retrying — it only decides whether a call is
//! admitted, and records the outcome of calls it let through. Retrying is
//! the pipeline's job (`crate::pipeline`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{OrchestratorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakerMode {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
struct AgentBreakerState {
    mode: BreakerMode,
    consecutive_failures: u32,
    consecutive_half_open_successes: u32,
    open_until: Option<Instant>,
    /// Set while a half-open probe is in flight; a half-open breaker admits
    /// exactly one concurrent call, so a second admission attempt while this
    /// is set is rejected rather than let through alongside the probe.
    half_open_probe_in_flight: bool,
}

impl AgentBreakerState {
    fn closed() -> Self {
        Self {
            mode: BreakerMode::Closed,
            consecutive_failures: 0,
            consecutive_half_open_successes: 0,
            open_until: None,
            half_open_probe_in_flight: false,
        }
    }
}

/// Thresholds and timeouts governing every agent's breaker. One config is
/// shared process-wide; per-agent *state* is not.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
    pub success_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(60),
            success_threshold: 2,
        }
    }
}

/// A snapshot of one agent's breaker state, for `inspect()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub mode: BreakerMode,
    pub consecutive_failures: u32,
}

/// Process-wide, shared mutable breaker registry keyed by agent id.
#[derive(Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    states: Arc<RwLock<HashMap<String, AgentBreakerState>>>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Ask whether `agent_id` may be invoked right now. OPEN admits a probe
    /// only once the open timeout has elapsed, transitioning to HALF_OPEN as
    /// it does so. HALF_OPEN admits exactly one concurrent probe; a second
    /// admission while that probe is unresolved is rejected.
    pub async fn admit(&self, task_id: &str, agent_id: &str) -> Result<()> {
        let mut states = self.states.write().await;
        let state = states.entry(agent_id.to_string()).or_insert_with(AgentBreakerState::closed);

        match state.mode {
            BreakerMode::Closed => Ok(()),
            BreakerMode::HalfOpen => {
                if state.half_open_probe_in_flight {
                    Err(OrchestratorError::BreakerHalfOpenReject {
                        task_id: task_id.to_string(),
                        agent_id: agent_id.to_string(),
                    })
                } else {
                    state.half_open_probe_in_flight = true;
                    Ok(())
                }
            }
            BreakerMode::Open => {
                let eligible = state.open_until.is_some_and(|until| Instant::now() >= until);
                if eligible {
                    tracing::info!(agent_id, "breaker transitioning OPEN -> HALF_OPEN for probe");
                    state.mode = BreakerMode::HalfOpen;
                    state.consecutive_half_open_successes = 0;
                    state.half_open_probe_in_flight = true;
                    Ok(())
                } else {
                    Err(OrchestratorError::BreakerOpen {
                        agent_id: agent_id.to_string(),
                    })
                }
            }
        }
    }

    /// Record the outcome of a call that `admit` allowed through.
    pub async fn record_outcome(&self, agent_id: &str, success: bool) {
        let mut states = self.states.write().await;
        let state = states.entry(agent_id.to_string()).or_insert_with(AgentBreakerState::closed);

        match (state.mode, success) {
            (BreakerMode::Closed, true) => {
                state.consecutive_failures = 0;
            }
            (BreakerMode::Closed, false) => {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= self.config.failure_threshold {
                    tracing::warn!(agent_id, "breaker tripped to OPEN");
                    state.mode = BreakerMode::Open;
                    state.open_until = Some(Instant::now() + self.config.open_timeout);
                }
            }
            (BreakerMode::HalfOpen, true) => {
                state.consecutive_half_open_successes += 1;
                if state.consecutive_half_open_successes >= self.config.success_threshold {
                    tracing::info!(agent_id, "breaker closing after half-open successes");
                    *state = AgentBreakerState::closed();
                } else {
                    state.half_open_probe_in_flight = false;
                }
            }
            (BreakerMode::HalfOpen, false) => {
                tracing::warn!(agent_id, "breaker reopening after half-open failure");
                state.mode = BreakerMode::Open;
                state.consecutive_failures = self.config.failure_threshold;
                state.consecutive_half_open_successes = 0;
                state.half_open_probe_in_flight = false;
                state.open_until = Some(Instant::now() + self.config.open_timeout);
            }
            (BreakerMode::Open, _) => {
                // A call slipped through during the OPEN->HALF_OPEN race; treat
                // it as a half-open outcome. The probe has already resolved by
                // the time we get here, so no in-flight flag to hold.
                state.mode = BreakerMode::HalfOpen;
                state.consecutive_half_open_successes = 0;
                state.half_open_probe_in_flight = false;
            }
        }
    }

    /// `call_through`: admit, invoke, record. The only place the breaker
    /// touches the actual call — everything else is bookkeeping.
    pub async fn call_through<F, Fut, T>(&self, task_id: &str, agent_id: &str, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        self.admit(task_id, agent_id).await?;
        let result = f().await;
        self.record_outcome(agent_id, result.is_ok()).await;
        result
    }

    pub async fn snapshot(&self, agent_id: &str) -> Option<BreakerSnapshot> {
        let states = self.states.read().await;
        states.get(agent_id).map(|s| BreakerSnapshot {
            mode: s.mode,
            consecutive_failures: s.consecutive_failures,
        })
    }

    pub async fn all_snapshots(&self) -> HashMap<String, BreakerSnapshot> {
        let states = self.states.read().await;
        states
            .iter()
            .map(|(id, s)| {
                (
                    id.clone(),
                    BreakerSnapshot {
                        mode: s.mode,
                        consecutive_failures: s.consecutive_failures,
                    },
                )
            })
            .collect()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
