//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;

use crate::coordinator::RequestOptions;

/// Most retries a fetch body may ask for.
pub const MAX_FETCH_RETRIES: u32 = 10;

/// Longest backoff base delay a fetch body may ask for (1 minute).
pub const MAX_FETCH_RETRY_DELAY_MS: u64 = 60_000;

/// Request body for a coordinated fetch (POST /fetch)
///
/// Every option is optional; unset options take the coordinator defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchRequest {
    /// Upstream URL to GET
    pub url: String,
    /// Deduplication key, defaults to `GET <url>`
    pub key: Option<String>,
    /// Serve from and store into the response cache
    #[serde(default)]
    pub cache: bool,
    pub cache_ttl_ms: Option<u64>,
    pub cache_key: Option<String>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

impl FetchRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.url.is_empty() {
            return Some("URL cannot be empty".to_string());
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Some("URL must start with http:// or https://".to_string());
        }
        if self.key.as_deref() == Some("") {
            return Some("Key cannot be empty".to_string());
        }
        if self.timeout_ms == Some(0) {
            return Some("Timeout must be greater than zero".to_string());
        }
        if self.retries.is_some_and(|r| r > MAX_FETCH_RETRIES) {
            return Some(format!("Retries cannot exceed {}", MAX_FETCH_RETRIES));
        }
        if self
            .retry_delay_ms
            .is_some_and(|d| d > MAX_FETCH_RETRY_DELAY_MS)
        {
            return Some(format!(
                "Retry delay cannot exceed {}ms",
                MAX_FETCH_RETRY_DELAY_MS
            ));
        }
        None
    }

    /// Key used for deduplication.
    pub fn request_key(&self) -> String {
        self.key
            .clone()
            .unwrap_or_else(|| format!("GET {}", self.url))
    }

    /// Builds coordinator options from the body.
    pub fn options(&self) -> RequestOptions {
        let mut options = RequestOptions::new().cache(self.cache);
        options.cache_ttl = self.cache_ttl_ms.map(Duration::from_millis);
        options.cache_key = self.cache_key.clone();
        options.timeout = self.timeout_ms.map(Duration::from_millis);
        options.retries = self.retries;
        options.retry_delay = self.retry_delay_ms.map(Duration::from_millis);
        options
    }
}

/// Request body for PUT /timeout
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutRequest {
    /// New default timeout in milliseconds
    pub timeout_ms: u64,
}

impl TimeoutRequest {
    pub fn validate(&self) -> Option<String> {
        if self.timeout_ms == 0 {
            return Some("Timeout must be greater than zero".to_string());
        }
        None
    }
}

/// Request body for PUT /connectivity
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectivityRequest {
    pub online: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_request_minimal() {
        let json = r#"{"url": "https://example.com/doc"}"#;
        let req: FetchRequest = serde_json::from_str(json).unwrap();

        assert!(!req.cache);
        assert!(req.validate().is_none());
        assert_eq!(req.request_key(), "GET https://example.com/doc");

        let options = req.options();
        assert!(!options.cache);
        assert!(options.timeout.is_none());
        assert!(options.retries.is_none());
    }

    #[test]
    fn test_fetch_request_full() {
        let json = r#"{
            "url": "http://localhost:9000/x",
            "key": "doc-x",
            "cache": true,
            "cache_ttl_ms": 5000,
            "timeout_ms": 2000,
            "retries": 1,
            "retry_delay_ms": 10
        }"#;
        let req: FetchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.request_key(), "doc-x");

        let options = req.options();
        assert!(options.cache);
        assert_eq!(options.cache_ttl, Some(Duration::from_secs(5)));
        assert_eq!(options.timeout, Some(Duration::from_secs(2)));
        assert_eq!(options.retries, Some(1));
        assert_eq!(options.retry_delay, Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut req: FetchRequest = serde_json::from_str(r#"{"url": "ftp://x"}"#).unwrap();
        assert!(req.validate().is_some());

        req.url = "https://example.com".to_string();
        req.timeout_ms = Some(0);
        assert!(req.validate().is_some());

        req.timeout_ms = None;
        req.key = Some(String::new());
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_bounds_retry_options() {
        let mut req: FetchRequest = serde_json::from_str(
            r#"{"url": "https://example.com", "retries": 4294967295}"#,
        )
        .unwrap();
        assert_eq!(req.validate().as_deref(), Some("Retries cannot exceed 10"));

        req.retries = Some(MAX_FETCH_RETRIES);
        assert!(req.validate().is_none());

        req.retry_delay_ms = Some(MAX_FETCH_RETRY_DELAY_MS + 1);
        assert!(req.validate().is_some());

        req.retry_delay_ms = Some(MAX_FETCH_RETRY_DELAY_MS);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_timeout_request_validation() {
        assert!(TimeoutRequest { timeout_ms: 0 }.validate().is_some());
        assert!(TimeoutRequest { timeout_ms: 10 }.validate().is_none());
    }
}
