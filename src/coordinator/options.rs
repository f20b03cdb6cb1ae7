//! Per-call request options.

use std::fmt;
use std::time::Duration;

use crate::config::MAX_TIMEOUT;
use crate::coordinator::progress::ProgressCallback;
use crate::coordinator::retry::RetryPolicy;
use crate::coordinator::signal::AbortSignal;

// == Request Options ==
/// Options for a single `request` call.
///
/// Every field is optional; unset fields take the coordinator's defaults.
///
/// # Example
/// ```ignore
/// let options = RequestOptions::new()
///     .cached(Duration::from_secs(60))
///     .retries(3)
///     .timeout(Duration::from_secs(10));
/// ```
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Per-attempt timeout, clamped to [`MAX_TIMEOUT`]
    pub timeout: Option<Duration>,
    /// Serve from and store into the response cache
    pub cache: bool,
    /// Lifetime of a stored response
    pub cache_ttl: Option<Duration>,
    /// Cache key, defaults to the request key
    pub cache_key: Option<String>,
    /// Retries after the first attempt
    pub retries: Option<u32>,
    /// Base delay for exponential backoff
    pub retry_delay: Option<Duration>,
    pub on_progress: Option<ProgressCallback>,
    pub signal: Option<AbortSignal>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables caching with the given TTL.
    pub fn cached(mut self, ttl: Duration) -> Self {
        self.cache = true;
        self.cache_ttl = Some(ttl);
        self
    }

    /// Enables caching with the coordinator's default TTL.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Fills unset fields from the coordinator defaults.
    pub(crate) fn resolve(self, key: &str, defaults: &RequestDefaults) -> ResolvedOptions {
        ResolvedOptions {
            timeout: self.timeout.unwrap_or(defaults.timeout).min(MAX_TIMEOUT),
            cache: self.cache,
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            cache_key: self.cache_key.unwrap_or_else(|| key.to_string()),
            policy: RetryPolicy {
                retries: self.retries.unwrap_or(defaults.retries),
                retry_delay: self.retry_delay.unwrap_or(defaults.retry_delay),
            },
            on_progress: self.on_progress,
            signal: self.signal,
        }
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("timeout", &self.timeout)
            .field("cache", &self.cache)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_key", &self.cache_key)
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("on_progress", &self.on_progress.is_some())
            .field("signal", &self.signal)
            .finish()
    }
}

/// Defaults applied to unset [`RequestOptions`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestDefaults {
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

/// Options with every default applied.
#[derive(Clone)]
pub(crate) struct ResolvedOptions {
    pub timeout: Duration,
    pub cache: bool,
    pub cache_ttl: Duration,
    pub cache_key: String,
    pub policy: RetryPolicy,
    pub on_progress: Option<ProgressCallback>,
    pub signal: Option<AbortSignal>,
}
