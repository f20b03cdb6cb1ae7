//! Retry and timeout procedure.
//!
//! # Data Flow
//! ```text
//! attempt 0..=retries:
//!     → emit in_progress (10 + 30 * attempt)
//!     → race requester against timeout and abort signal
//!     → Ok: done
//!     → Err: aborted or permanent → return
//!            retryable and attempts left → sleep backoff (racing abort) → next
//!            otherwise → return last error
//! ```
//!
//! Timers and signal subscriptions live inside `select!` branches, so the
//! losing side is dropped on every exit path.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::coordinator::progress::{ProgressReporter, ProgressStatus};
use crate::coordinator::signal::{wait_for_abort, AbortSignal};
use crate::error::{ErrorKind, RequestError, Result};

/// Minimum wait before retrying a rate-limited request.
pub const RATE_LIMIT_MIN_DELAY: Duration = Duration::from_millis(5_000);

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    /// Base delay, doubled after every failed attempt
    pub retry_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (zero-based).
    ///
    /// `retry_delay * 2^attempt`, raised to [`RATE_LIMIT_MIN_DELAY`] for
    /// rate-limited failures.
    pub fn backoff(&self, attempt: u32, kind: ErrorKind) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        let delay = self.retry_delay.saturating_mul(factor);

        if kind == ErrorKind::RateLimited {
            delay.max(RATE_LIMIT_MIN_DELAY)
        } else {
            delay
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Progress percentage reported before `attempt`.
fn attempt_progress(attempt: u32) -> u8 {
    10u32.saturating_add(attempt.saturating_mul(30)).min(100) as u8
}

/// Runs `requester` under the retry policy, bounding every attempt by `timeout`.
pub(crate) async fn execute_with_retry<T, F, Fut>(
    key: &str,
    mut requester: F,
    policy: RetryPolicy,
    timeout: Duration,
    reporter: &ProgressReporter,
    signal: Option<&AbortSignal>,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        let message = if attempt > 0 {
            format!("Processing request (retry {}/{})...", attempt, policy.retries)
        } else {
            "Processing request...".to_string()
        };
        reporter.emit(ProgressStatus::InProgress, message, Some(attempt_progress(attempt)));

        let err = match execute_with_timeout(key, &mut requester, timeout, reporter, signal).await {
            Ok(value) => {
                if attempt > 0 {
                    info!("Request {} completed successfully after {} retries", key, attempt);
                } else {
                    info!("Request {} completed successfully", key);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if signal.is_some_and(AbortSignal::is_aborted) {
            debug!("Request {} aborted by caller", key);
            return Err(RequestError::Cancelled);
        }

        if !err.is_retryable() {
            debug!("Request {} - non-retryable error: {}", key, err);
            return Err(err);
        }

        if attempt >= policy.retries {
            error!("Request {} failed after {} attempts", key, attempt + 1);
            return Err(exhausted(err, attempt + 1));
        }

        let delay = policy.backoff(attempt, err.kind());
        info!(
            "Retrying request {} after {}ms (attempt {}/{})",
            key,
            delay.as_millis(),
            attempt + 1,
            policy.retries
        );
        reporter.emit(
            ProgressStatus::InProgress,
            format!("Retrying in {}ms...", delay.as_millis()),
            Some(attempt_progress(attempt)),
        );

        tokio::select! {
            _ = wait_for_abort(signal) => return Err(RequestError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}

/// Runs one attempt, racing it against the deadline and the abort signal.
async fn execute_with_timeout<T, F, Fut>(
    key: &str,
    requester: &mut F,
    timeout: Duration,
    reporter: &ProgressReporter,
    signal: Option<&AbortSignal>,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if signal.is_some_and(AbortSignal::is_aborted) {
        return Err(RequestError::Cancelled);
    }

    let call = requester();

    tokio::select! {
        biased;
        _ = wait_for_abort(signal) => Err(RequestError::Cancelled),
        outcome = tokio::time::timeout(timeout, call) => match outcome {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!("Request {} timed out after {}ms", key, timeout.as_millis());
                reporter.emit(
                    ProgressStatus::Timeout,
                    format!("Request timed out after {} seconds", timeout.as_secs_f64()),
                    None,
                );
                Err(RequestError::Timeout(timeout))
            }
        },
    }
}

/// Final error once retries run out. Rate limits get actionable advice.
fn exhausted(err: RequestError, attempts: u32) -> RequestError {
    if err.kind() != ErrorKind::RateLimited {
        return err;
    }

    RequestError::new(
        ErrorKind::RateLimited,
        format!(
            "Rate limit exceeded after {} attempts ({}). Please wait a moment and try again, \
             or upgrade your API plan for higher rate limits.",
            attempts, err
        ),
    )
}
