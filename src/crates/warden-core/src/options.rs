//! The configuration surface passed to `submit()`.

use crate::error::{OrchestratorError, Result};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub fan_out_limit: usize,
    pub default_ttl_secs: u64,
    pub backoff_schedule_secs: Vec<u64>,
    pub breaker_failure_threshold: u32,
    pub breaker_open_timeout_secs: u64,
    pub breaker_success_threshold: u32,
    pub confidence_floor: f64,
    pub chain_depth_cap: u32,
    pub sycophancy_threshold: f64,
    pub depth_decay_base: f64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fan_out_limit: 8,
            default_ttl_secs: 300,
            backoff_schedule_secs: vec![2, 4, 8],
            breaker_failure_threshold: 5,
            breaker_open_timeout_secs: 60,
            breaker_success_threshold: 2,
            confidence_floor: 0.5,
            chain_depth_cap: 3,
            sycophancy_threshold: 0.30,
            depth_decay_base: 0.9,
        }
    }
}

impl RunOptions {
    pub fn with_fan_out_limit(mut self, limit: usize) -> Self {
        self.fan_out_limit = limit;
        self
    }

    pub fn with_default_ttl_secs(mut self, ttl: u64) -> Self {
        self.default_ttl_secs = ttl;
        self
    }

    pub fn with_backoff_schedule_secs(mut self, schedule: Vec<u64>) -> Self {
        self.backoff_schedule_secs = schedule;
        self
    }

    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor;
        self
    }

    pub fn with_chain_depth_cap(mut self, cap: u32) -> Self {
        self.chain_depth_cap = cap;
        self
    }

    pub fn with_sycophancy_threshold(mut self, threshold: f64) -> Self {
        self.sycophancy_threshold = threshold;
        self
    }

    /// Invariants not spelled out as a type: a
    /// fan-out limit of zero would deadlock every level, an empty backoff
    /// schedule would make retries instantaneous, and thresholds outside
    /// their natural range are almost certainly a misconfiguration.
    pub fn validate(&self) -> Result<()> {
        if self.fan_out_limit < 1 {
            return Err(OrchestratorError::Custom(
                "fan_out_limit must be >= 1".to_string(),
            ));
        }
        if self.backoff_schedule_secs.is_empty() {
            return Err(OrchestratorError::Custom(
                "backoff_schedule_secs must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(OrchestratorError::Custom(
                "confidence_floor must be in [0,1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sycophancy_threshold) {
            return Err(OrchestratorError::Custom(
                "sycophancy_threshold must be in [0,1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.depth_decay_base) {
            return Err(OrchestratorError::Custom(
                "depth_decay_base must be in [0,1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Load overrides from environment variables, falling back to
    /// `Default` for anything unset (`WARDEN_FANOUT_LIMIT`,
    /// `WARDEN_CONFIDENCE_FLOOR`, etc.), the way `warden-cli`'s demo
    /// scenarios tune thresholds without plumbing a flag per knob.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let options = Self {
            fan_out_limit: warden_tooling::config::get_env_parse_or(
                "WARDEN_FANOUT_LIMIT",
                defaults.fan_out_limit,
            )
            .map_err(|e| OrchestratorError::Custom(e.to_string()))?,
            confidence_floor: warden_tooling::config::get_env_parse_or(
                "WARDEN_CONFIDENCE_FLOOR",
                defaults.confidence_floor,
            )
            .map_err(|e| OrchestratorError::Custom(e.to_string()))?,
            breaker_failure_threshold: warden_tooling::config::get_env_parse_or(
                "WARDEN_BREAKER_FAILURE_THRESHOLD",
                defaults.breaker_failure_threshold,
            )
            .map_err(|e| OrchestratorError::Custom(e.to_string()))?,
            ..defaults
        };
        options.validate()?;
        Ok(options)
    }
}
