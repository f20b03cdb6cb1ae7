//! Cache Sweep Task
//!
//! Background task that periodically removes stale cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically removes stale cache entries.
///
/// The task sleeps for `interval` between sweeps and only holds the write
/// lock for the duration of one sweep, so callers are never blocked for long.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cleanup_handle = spawn_cleanup_task(coordinator.cache(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<RwLock<CacheStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache sweep task with interval of {} seconds",
            interval.as_secs_f64()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();

            if removed > 0 {
                debug!("Cleaned {} expired cache entries", removed);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = Arc::new(RwLock::new(CacheStore::new()));
        cache
            .write()
            .await
            .insert("expire_soon", "value".to_string(), Duration::from_secs(1));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));

        // One sweep at 60s
        tokio::time::sleep(Duration::from_secs(61)).await;

        {
            let cache_guard = cache.read().await;
            assert!(cache_guard.is_empty(), "Expired entry should have been swept");
            assert_eq!(cache_guard.stats().expired, 1);
        }

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = Arc::new(RwLock::new(CacheStore::new()));
        cache
            .write()
            .await
            .insert("long_lived", "value".to_string(), Duration::from_secs(3600));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(125)).await;

        {
            let mut cache_guard = cache.write().await;
            assert_eq!(
                cache_guard.get::<String>("long_lived").as_deref(),
                Some("value"),
                "Valid entry should not be removed"
            );
        }

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_waits_for_interval() {
        let cache = Arc::new(RwLock::new(CacheStore::new()));
        cache
            .write()
            .await
            .insert("short", (), Duration::from_secs(1));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));

        // Stale but not yet swept: lazy removal only happens on lookup
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(cache.read().await.len(), 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(cache.read().await.len(), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = Arc::new(RwLock::new(CacheStore::new()));

        let handle = spawn_cleanup_task(cache, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
