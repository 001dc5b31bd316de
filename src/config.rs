//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from environment variables.

use std::env;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds for cached responses
    pub ttl_seconds: u64,
    /// Interval in seconds between background expiry sweeps
    pub check_period_seconds: u64,
    /// Maximum number of cached responses
    pub max_entries: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECONDS` - Default TTL in seconds (default: 60)
    /// - `CACHE_CHECK_PERIOD_SECONDS` - Sweep frequency in seconds (default: 120)
    /// - `CACHE_MAX_ENTRIES` - Maximum cached responses (default: 1000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_seconds: env_or("CACHE_TTL_SECONDS", defaults.ttl_seconds),
            check_period_seconds: env_or(
                "CACHE_CHECK_PERIOD_SECONDS",
                defaults.check_period_seconds,
            ),
            max_entries: env_or("CACHE_MAX_ENTRIES", defaults.max_entries),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            check_period_seconds: 120,
            max_entries: 1000,
            server_port: 3000,
        }
    }
}

/// Parses an environment variable, falling back to `default` when unset or malformed.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
