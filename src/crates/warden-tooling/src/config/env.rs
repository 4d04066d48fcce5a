//! Environment variable loading for `RunOptions::from_env` and the CLI's
//! log-level/verbosity overrides.

use crate::{Result, ToolingError};
use std::env;
use std::str::FromStr;

/// Load an environment variable as a string.
///
/// `Ok(None)` means the variable is unset; an `Err` means it was set but
/// isn't valid UTF-8.
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ToolingError::General(format!(
            "environment variable {} contains invalid UTF-8",
            key
        ))),
    }
}

/// Load and parse an environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use warden_tooling::config::get_env_parse;
///
/// let fan_out: Option<usize> = get_env_parse("WARDEN_FANOUT_LIMIT")?;
/// # Ok::<(), warden_tooling::ToolingError>(())
/// ```
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env(key)? {
        Some(val) => {
            let parsed = val.parse::<T>().map_err(|e| {
                ToolingError::General(format!(
                    "failed to parse environment variable {}: {}",
                    key, e
                ))
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Load an environment variable, falling back to `default` when unset.
///
/// `warden-cli` uses this for `WARDEN_LOG_LEVEL` when `--verbose` wasn't
/// passed.
pub fn get_env_or(key: &str, default: impl Into<String>) -> Result<String> {
    Ok(get_env(key)?.unwrap_or_else(|| default.into()))
}

/// Load and parse an environment variable, falling back to `default` when
/// unset.
///
/// `RunOptions::from_env` uses this for every numeric override
/// (`WARDEN_FANOUT_LIMIT`, `WARDEN_CONFIDENCE_FLOOR`,
/// `WARDEN_BREAKER_FAILURE_THRESHOLD`) so an unset or empty variable falls
/// back to the compiled-in default rather than failing submission.
pub fn get_env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse(key)?.unwrap_or(default))
}

/// Load a boolean environment variable.
///
/// Recognizes `"true"`/`"1"`/`"yes"`/`"on"` as true and
/// `"false"`/`"0"`/`"no"`/`"off"` as false, case-insensitively.
pub fn get_env_bool(key: &str) -> Result<Option<bool>> {
    match get_env(key)? {
        Some(val) => {
            let lower = val.to_lowercase();
            let result = match lower.as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(ToolingError::General(format!(
                        "invalid boolean value for {}: {}",
                        key, val
                    )))
                }
            };
            Ok(Some(result))
        }
        None => Ok(None),
    }
}
