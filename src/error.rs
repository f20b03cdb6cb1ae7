//! Error types for the request coordinator
//!
//! Provides a structured error type using thiserror. Every failure carries an
//! [`ErrorKind`] so retry decisions never depend on message text alone.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// == Error Kind ==
/// Classification of a failure, used to decide retry eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid or missing credentials
    Auth,
    /// Malformed request rejected by the upstream service
    Validation,
    /// Content blocked by a safety or content policy
    Safety,
    /// Response could not be parsed
    Parse,
    /// No network connectivity
    Offline,
    /// Cancelled through an abort signal
    Cancelled,
    /// Upstream rate limit hit (HTTP 429)
    RateLimited,
    /// An attempt exceeded its deadline
    Timeout,
    /// Transport-level failure
    Network,
    /// Transient server failure (HTTP 502/503/504)
    ServerUnavailable,
    /// Anything not matching a known pattern
    Other,
}

/// Message fragments that mark an error as permanent, checked before anything else.
const NON_RETRYABLE_PATTERNS: &[(&str, ErrorKind)] = &[
    ("invalid api key", ErrorKind::Auth),
    ("invalid request", ErrorKind::Validation),
    ("blocked by safety", ErrorKind::Safety),
    ("parse", ErrorKind::Parse),
    ("no internet connection", ErrorKind::Offline),
];

const RATE_LIMIT_PATTERNS: &[&str] = &["429", "rate limit"];

const RETRYABLE_PATTERNS: &[(&str, ErrorKind)] = &[
    ("timeout", ErrorKind::Timeout),
    ("network", ErrorKind::Network),
    ("temporarily unavailable", ErrorKind::ServerUnavailable),
    ("502", ErrorKind::ServerUnavailable),
    ("503", ErrorKind::ServerUnavailable),
    ("504", ErrorKind::ServerUnavailable),
];

impl ErrorKind {
    /// Classifies an opaque error message by substring matching.
    ///
    /// Matching is case-insensitive. Permanent patterns win over transient ones,
    /// so "Invalid request: network field missing" is `Validation`.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        if let Some((_, kind)) = NON_RETRYABLE_PATTERNS
            .iter()
            .find(|(pattern, _)| lower.contains(pattern))
        {
            return *kind;
        }

        if RATE_LIMIT_PATTERNS.iter().any(|p| lower.contains(p)) {
            return ErrorKind::RateLimited;
        }

        RETRYABLE_PATTERNS
            .iter()
            .find(|(pattern, _)| lower.contains(pattern))
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::Other)
    }

    /// Maps an upstream HTTP status code to a kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 404 | 405 | 409 | 413 | 415 => ErrorKind::Validation,
            401 | 403 => ErrorKind::Auth,
            408 => ErrorKind::Timeout,
            422 => ErrorKind::Safety,
            429 => ErrorKind::RateLimited,
            502..=504 => ErrorKind::ServerUnavailable,
            _ => ErrorKind::Other,
        }
    }

    /// Returns true for transient failures worth another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout
                | ErrorKind::Network
                | ErrorKind::ServerUnavailable
                | ErrorKind::RateLimited
        )
    }

    /// Status code reported by the admin API for this kind of failure.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Safety => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Offline => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Network
            | ErrorKind::ServerUnavailable
            | ErrorKind::Parse
            | ErrorKind::Other => StatusCode::BAD_GATEWAY,
        }
    }
}

// == Request Error ==
/// Unified error type for coordinated requests.
///
/// Cloneable because deduplicated callers all observe the same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Connectivity indicator reported offline
    #[error("No internet connection. Please check your network and try again.")]
    Offline,

    /// A single attempt exceeded its deadline
    #[error(
        "Request timeout: The request took longer than {} seconds. Please try again.",
        .0.as_secs_f64()
    )]
    Timeout(Duration),

    /// Aborted through the caller's signal
    #[error("Request was cancelled")]
    Cancelled,

    /// The requester failed
    #[error("{message}")]
    Failed { kind: ErrorKind, message: String },

    /// Fault inside the coordinator itself
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RequestError {
    // == Constructors ==
    /// Creates a requester failure with an explicit kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RequestError::Failed {
            kind,
            message: message.into(),
        }
    }

    /// Creates a requester failure classified from its message.
    ///
    /// Use this for errors coming from libraries that only expose text.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = ErrorKind::classify(&message);
        RequestError::Failed { kind, message }
    }

    /// Creates a requester failure from an upstream HTTP status and body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("Upstream responded with status {}", status)
        } else {
            format!("Upstream responded with status {}: {}", status, body)
        };
        RequestError::Failed {
            kind: ErrorKind::from_status(status),
            message,
        }
    }

    /// Shorthand for a validation failure raised by our own input checks.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    // == Kind ==
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Offline => ErrorKind::Offline,
            RequestError::Timeout(_) => ErrorKind::Timeout,
            RequestError::Cancelled => ErrorKind::Cancelled,
            RequestError::Failed { kind, .. } => *kind,
            RequestError::Internal(_) => ErrorKind::Other,
        }
    }

    /// Returns true if another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() || err.is_request() {
            ErrorKind::Network
        } else if err.is_decode() || err.is_body() {
            ErrorKind::Parse
        } else if let Some(status) = err.status() {
            ErrorKind::from_status(status.as_u16())
        } else if err.is_builder() {
            ErrorKind::Validation
        } else {
            ErrorKind::classify(&err.to_string())
        };

        RequestError::Failed {
            kind,
            message: err.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match &self {
            RequestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            other => other.kind().status_code(),
        };

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for coordinated requests.
pub type Result<T> = std::result::Result<T, RequestError>;
