//! Environment-variable overrides for run configuration.
//!
//! `RunOptions::from_env` layers these over its compiled-in defaults so a
//! deployment can tune thresholds without plumbing a flag per knob, and
//! `warden-cli` reads `WARDEN_LOG_LEVEL`/`WARDEN_VERBOSE` the same way to
//! pick its default log level.
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_tooling::config::{get_env_bool, get_env_parse_or};
//!
//! let fan_out_limit: usize = get_env_parse_or("WARDEN_FANOUT_LIMIT", 8)?;
//! let verbose = get_env_bool("WARDEN_VERBOSE")?.unwrap_or(false);
//! # Ok::<(), warden_tooling::ToolingError>(())
//! ```

mod env;

pub use env::{get_env, get_env_bool, get_env_or, get_env_parse, get_env_parse_or};
