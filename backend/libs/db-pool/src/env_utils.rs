//! Environment variable parsing utilities
//!
//! Unset variables fall back to a default; set-but-unparsable variables are
//! reported instead of silently ignored.

use std::fmt::Display;
use std::str::FromStr;

/// Parse an environment variable with a default fallback
///
/// # Example
/// ```
/// let port: u16 = db_pool::env_utils::parse_env_or("SOME_UNSET_PORT_VAR", 8000).unwrap();
/// assert_eq!(port, 8000);
/// ```
pub fn parse_env_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

/// Read a string environment variable with a default fallback
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
