//! Structured-logging helpers layered on top of `tracing`.
//!
//! `warden-core`'s pipeline uses [`timed`] to bracket an agent invocation
//! with start/elapsed debug lines, [`LogGuard`] to do the same for the
//! whole per-task pipeline run, and [`sanitize_for_logging`] to redact
//! anything that looks like a credential out of agent-authored reasoning
//! text before it reaches a log line.

use std::time::Instant;
use tracing::debug;

/// Run `future`, logging its start and elapsed time at debug level under
/// `name`.
///
/// # Example
///
/// ```rust,ignore
/// use warden_tooling::logging::timed;
///
/// async fn invoke_agent() -> Result<(), ()> { Ok(()) }
///
/// timed("agent_invoke", invoke_agent()).await.unwrap();
/// ```
pub async fn timed<F, T>(name: &str, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = Instant::now();
    debug!("starting: {}", name);

    let result = future.await;

    let elapsed = start.elapsed();
    debug!("completed: {} in {}", name, format_duration(elapsed));

    result
}

/// RAII guard logging entry on construction and elapsed time on drop.
///
/// # Example
///
/// ```rust
/// use warden_tooling::logging::LogGuard;
///
/// fn execute_task(task_id: &str) {
///     let _guard = LogGuard::new(format!("execute_task:{task_id}"));
///     // task execution happens here; the guard logs on drop
/// }
/// ```
pub struct LogGuard {
    name: String,
    start: Instant,
}

impl LogGuard {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug!("entering: {}", name);

        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Elapsed time since the guard was created.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        debug!("exiting: {} (elapsed: {})", self.name, format_duration(elapsed));
    }
}

/// Format a duration in human-readable form (μs/ms/s/m+s tiers).
///
/// # Example
///
/// ```rust
/// use warden_tooling::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
/// assert_eq!(format_duration(Duration::from_micros(500)), "500μs");
/// ```
pub fn format_duration(duration: std::time::Duration) -> String {
    let micros = duration.as_micros();

    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{}ms", micros / 1000)
    } else if micros < 60_000_000 {
        format!("{:.2}s", micros as f64 / 1_000_000.0)
    } else {
        let seconds = micros / 1_000_000;
        let minutes = seconds / 60;
        let secs = seconds % 60;
        format!("{}m{}s", minutes, secs)
    }
}

/// Redact substrings that look like a credential (API key, password, token,
/// bearer header) before logging `input`.
///
/// Agent-authored `reasoning_trace` text is logged at debug level by the
/// pipeline; this is the one thing standing between a careless agent
/// echoing a secret back in its reasoning and that secret landing in logs.
///
/// # Example
///
/// ```rust
/// use warden_tooling::logging::sanitize_for_logging;
///
/// let trace = "used API key: sk-abc123 to look up the record";
/// let sanitized = sanitize_for_logging(trace);
/// assert!(sanitized.contains("[REDACTED]"));
/// assert!(!sanitized.contains("sk-abc123"));
/// ```
pub fn sanitize_for_logging(input: &str) -> String {
    let mut result = input.to_string();

    let patterns = [
        (r"(?i)(api[\s_-]?key|apikey)\s*[:=]\s*\S+", "$1: [REDACTED]"),
        (r"(?i)(password|passwd|pwd)\s*[:=]\s*\S+", "$1: [REDACTED]"),
        (r"(?i)(token)\s*[:=]\s*\S+", "$1: [REDACTED]"),
        (r"(?i)(secret)\s*[:=]\s*\S+", "$1: [REDACTED]"),
        (
            r"(?i)(authorization|auth)\s*:\s*bearer\s+\S+",
            "$1: Bearer [REDACTED]",
        ),
    ];

    for (pattern, replacement) in &patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            result = re.replace_all(&result, *replacement).to_string();
        }
    }

    result
}
