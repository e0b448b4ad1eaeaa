//! Environment-variable configuration.
//!
//! Only variables that are set in the environment take effect; everything
//! else falls back to built-in defaults or the caller's arguments.
//!
//! | Variable | Type | Effect |
//! |----------|------|--------|
//! | `FILAMENT_BARRIER_DEBUG` | `bool` | Overrides the `debug` flag at barrier creation |
//! | `FILAMENT_REDUCE_CHUNK` | `usize` (≥ 1) | Overrides the reduction chunk size |

use tracing::warn;

/// Environment variable overriding barrier debug tracing.
pub const ENV_BARRIER_DEBUG: &str = "FILAMENT_BARRIER_DEBUG";
/// Environment variable overriding the reduction chunk size.
pub const ENV_REDUCE_CHUNK: &str = "FILAMENT_REDUCE_CHUNK";

/// Default number of elements folded per forked reduction task.
pub const DEFAULT_REDUCE_CHUNK: usize = 10_000;

/// Error produced when a set variable holds an unparseable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    variable: &'static str,
    value: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid value {:?} for {}", self.value, self.variable)
    }
}

impl std::error::Error for ConfigError {}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parses a boolean variable: `1`/`true`/`yes` and `0`/`false`/`no`,
/// case-insensitive.
fn parse_bool(variable: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError {
            variable,
            value: value.to_owned(),
        }),
    }
}

fn parse_chunk(variable: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ConfigError {
            variable,
            value: value.to_owned(),
        }),
    }
}

/// Returns the barrier-debug override, if the variable is set and valid.
///
/// An unparseable value is reported once at warn level and ignored rather
/// than failing barrier construction.
pub(crate) fn barrier_debug_override() -> Option<bool> {
    let value = read_env(ENV_BARRIER_DEBUG)?;
    match parse_bool(ENV_BARRIER_DEBUG, &value) {
        Ok(flag) => Some(flag),
        Err(err) => {
            warn!(%err, "ignoring barrier debug override");
            None
        }
    }
}

/// Returns the effective reduction chunk size.
///
/// # Errors
/// Returns [`ConfigError`] if the variable is set but not a positive
/// integer.
pub fn reduce_chunk_size() -> Result<usize, ConfigError> {
    match read_env(ENV_REDUCE_CHUNK) {
        Some(value) => parse_chunk(ENV_REDUCE_CHUNK, &value),
        None => Ok(DEFAULT_REDUCE_CHUNK),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{env_lock, init_test_logging};

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        init_test("bool_parsing_accepts_common_spellings");
        for truthy in ["1", "true", "YES"] {
            assert_eq!(parse_bool(ENV_BARRIER_DEBUG, truthy), Ok(true));
        }
        for falsy in ["0", "False", "no"] {
            assert_eq!(parse_bool(ENV_BARRIER_DEBUG, falsy), Ok(false));
        }
        assert!(parse_bool(ENV_BARRIER_DEBUG, "maybe").is_err());
    }

    #[test]
    fn chunk_size_env_override_applies() {
        init_test("chunk_size_env_override_applies");
        let _guard = env_lock();
        std::env::remove_var(ENV_REDUCE_CHUNK);
        assert_eq!(reduce_chunk_size(), Ok(DEFAULT_REDUCE_CHUNK));

        std::env::set_var(ENV_REDUCE_CHUNK, "128");
        assert_eq!(reduce_chunk_size(), Ok(128));

        std::env::set_var(ENV_REDUCE_CHUNK, "0");
        assert!(reduce_chunk_size().is_err());

        std::env::remove_var(ENV_REDUCE_CHUNK);
    }
}
