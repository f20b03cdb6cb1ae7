//! Cancellation tokens.
//!
//! An [`AbortController`] owns the abort flag; any number of [`AbortSignal`]
//! observers can check it or wait for it. Both are backed by a `watch` channel,
//! so waiting registers no listener that outlives the wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

// == Abort Controller ==
/// Owner side of a cancellation token.
#[derive(Debug, Clone)]
pub struct AbortController {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Returns an observer for this controller.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Aborts every associated signal. Aborting twice is a no-op.
    pub fn abort(&self) {
        self.tx.send_if_modified(|aborted| {
            let changed = !*aborted;
            *aborted = true;
            changed
        });
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Aborts after `delay` from a background task.
    ///
    /// Abort the returned handle to cancel the timer.
    pub fn abort_after(&self, delay: Duration) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.abort();
        })
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

// == Abort Signal ==
/// Observer side of a cancellation token.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal is aborted.
    ///
    /// Never resolves if the controller is dropped without aborting.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Waits on an optional signal; `None` never resolves.
pub(crate) async fn wait_for_abort(signal: Option<&AbortSignal>) {
    match signal {
        Some(signal) => signal.aborted().await,
        None => std::future::pending().await,
    }
}
