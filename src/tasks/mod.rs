//! Background Tasks Module
//!
//! Contains background tasks that run alongside the coordinator.
//!
//! # Tasks
//! - Cache sweep: removes stale cache entries at a fixed interval
//! - Connectivity listener: follows online/offline transitions

mod cleanup;
mod connectivity;

pub use cleanup::spawn_cleanup_task;
pub use connectivity::spawn_connectivity_listener;

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::coordinator::RequestCoordinator;

/// Handles to the coordinator's background tasks.
#[derive(Debug)]
pub struct BackgroundTasks {
    cleanup: JoinHandle<()>,
    connectivity: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Starts the cache sweep and the connectivity listener for `coordinator`.
    pub fn start(coordinator: &RequestCoordinator, sweep_interval: Duration) -> Self {
        let tasks = Self {
            cleanup: spawn_cleanup_task(coordinator.cache(), sweep_interval),
            connectivity: spawn_connectivity_listener(coordinator.clone()),
        };
        info!("Request coordinator initialized");
        tasks
    }

    /// Aborts both tasks.
    pub fn shutdown(self) {
        self.cleanup.abort();
        self.connectivity.abort();
    }
}
