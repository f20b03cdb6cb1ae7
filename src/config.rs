//! Configuration Module
//!
//! Loads coordinator and admin server settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Hard ceiling applied to every request timeout (2 minutes).
pub const MAX_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Coordinator and server configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default per-attempt timeout in milliseconds, clamped to [`MAX_TIMEOUT`]
    pub default_timeout_ms: u64,
    /// Default cache TTL in milliseconds
    pub cache_ttl_ms: u64,
    /// Default number of retries after the first attempt
    pub max_retries: u32,
    /// Default base delay for exponential backoff in milliseconds
    pub retry_delay_ms: u64,
    /// Cache sweep interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TIMEOUT_MS` - Per-attempt timeout (default: 30000)
    /// - `CACHE_TTL_MS` - Cache TTL (default: 300000)
    /// - `MAX_RETRIES` - Retries after the first attempt (default: 2)
    /// - `RETRY_DELAY_MS` - Backoff base delay (default: 1000)
    /// - `CLEANUP_INTERVAL` - Cache sweep frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_timeout_ms: env_or("DEFAULT_TIMEOUT_MS", defaults.default_timeout_ms)
                .min(MAX_TIMEOUT.as_millis() as u64),
            cache_ttl_ms: env_or("CACHE_TTL_MS", defaults.cache_ttl_ms),
            max_retries: env_or("MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("RETRY_DELAY_MS", defaults.retry_delay_ms),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms).min(MAX_TIMEOUT)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            cache_ttl_ms: 300_000,
            max_retries: 2,
            retry_delay_ms: 1_000,
            cleanup_interval: 60,
            server_port: 3000,
        }
    }
}

/// Reads and parses an environment variable, falling back on absence or parse failure.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
