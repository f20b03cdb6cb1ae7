//! Host connectivity indicator.
//!
//! Whoever knows about the network (a probe, a platform hook, the admin API)
//! publishes online/offline transitions here; the coordinator reads the flag
//! and subscribes to change events.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared online/offline flag with change notification.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    /// Creates an indicator with the given initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Publishes a new state. Subscribers are only woken on an actual change.
    ///
    /// Returns true if the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        self.tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        })
    }

    /// Returns a receiver that observes every subsequent transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
