//! Progress reporting.
//!
//! Each `request` call may carry a callback that receives [`Progress`] events.
//! Callbacks run synchronously on the emitting task; a panicking callback is
//! contained and logged so it never changes the request outcome.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::cache::current_timestamp_ms;

// == Status ==
/// Lifecycle state reported by a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Pending,
    InProgress,
    Success,
    Error,
    Timeout,
    Offline,
}

impl ProgressStatus {
    /// Returns true for statuses that close an attempt window.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProgressStatus::Success
                | ProgressStatus::Error
                | ProgressStatus::Timeout
                | ProgressStatus::Offline
        )
    }
}

// == Progress Event ==
/// A single progress notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub status: ProgressStatus,
    /// Human-readable status text
    pub message: String,
    /// Completion percentage (0-100), when meaningful
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Emission time (Unix milliseconds)
    pub timestamp: i64,
}

impl Progress {
    pub fn new(status: ProgressStatus, message: impl Into<String>, progress: Option<u8>) -> Self {
        Self {
            status,
            message: message.into(),
            progress: progress.map(|p| p.min(100)),
            timestamp: current_timestamp_ms(),
        }
    }

    /// Creates a callback that forwards events into a channel.
    ///
    /// The receiver yields a request's events as a stream; it ends once every
    /// clone of the callback has been dropped.
    pub fn channel() -> (ProgressCallback, mpsc::UnboundedReceiver<Progress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback: ProgressCallback = Arc::new(move |event: &Progress| {
            let _ = tx.send(event.clone());
        });
        (callback, rx)
    }
}

/// Caller-supplied progress callback.
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

// == Reporter ==
/// Emits progress events for one request to an optional callback.
#[derive(Clone)]
pub(crate) struct ProgressReporter {
    key: Arc<str>,
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub(crate) fn new(key: &str, callback: Option<ProgressCallback>) -> Self {
        Self {
            key: Arc::from(key),
            callback,
        }
    }

    pub(crate) fn emit(&self, status: ProgressStatus, message: impl Into<String>, progress: Option<u8>) {
        let Some(callback) = &self.callback else {
            return;
        };

        let event = Progress::new(status, message, progress);
        if panic::catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
            warn!(
                "Progress callback for request {} panicked on {:?} event, ignoring",
                self.key, event.status
            );
        }
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("key", &self.key)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_clamped() {
        let event = Progress::new(ProgressStatus::InProgress, "working", Some(130));
        assert_eq!(event.progress, Some(100));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ProgressStatus::Success.is_terminal());
        assert!(ProgressStatus::Timeout.is_terminal());
        assert!(!ProgressStatus::Pending.is_terminal());
        assert!(!ProgressStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_channel_forwards_events() {
        let (callback, mut rx) = Progress::channel();
        let reporter = ProgressReporter::new("job", Some(callback));

        reporter.emit(ProgressStatus::Pending, "Initializing request...", Some(0));
        reporter.emit(ProgressStatus::Success, "done", Some(100));
        drop(reporter);

        let first = rx.try_recv().unwrap();
        assert_eq!(first.status, ProgressStatus::Pending);
        assert_eq!(first.progress, Some(0));
        assert_eq!(rx.try_recv().unwrap().status, ProgressStatus::Success);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let callback: ProgressCallback = Arc::new(|_: &Progress| panic!("ui went away"));
        let reporter = ProgressReporter::new("job", Some(callback));

        reporter.emit(ProgressStatus::Pending, "Initializing request...", Some(0));
    }

    #[test]
    fn test_serialized_shape() {
        let event = Progress::new(ProgressStatus::InProgress, "Retrying in 1000ms...", None);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["status"], "in_progress");
        assert!(json.get("progress").is_none());
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }
}
