//! Connectivity Listener Task
//!
//! Follows online/offline transitions published on the coordinator's
//! [`Connectivity`](crate::coordinator::Connectivity) indicator.

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::coordinator::RequestCoordinator;

/// Spawns a task that refreshes the coordinator's connectivity flag on every
/// transition and logs it. Runs until aborted.
pub fn spawn_connectivity_listener(coordinator: RequestCoordinator) -> JoinHandle<()> {
    let mut changes = coordinator.connectivity().subscribe();

    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            if coordinator.check_online_status() {
                info!("Network connection restored");
            } else {
                warn!("Network connection lost - entering offline mode");
            }
        }
    })
}
