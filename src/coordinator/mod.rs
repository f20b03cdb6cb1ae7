//! Request Coordinator
//!
//! Wraps keyed asynchronous work with offline detection, a TTL response
//! cache, in-flight deduplication, per-attempt timeouts and exponential
//! backoff retry, reporting progress along the way.
//!
//! # Data Flow
//! ```text
//! request(key, requester, options)
//!     → pending progress
//!     → offline?            → Err(Offline)
//!     → cache hit?          → Ok(cached)
//!     → pending for key?    → await the same execution
//!     → spawn execution     → retry.rs (timeout + backoff) → cache store
//!     → success / error progress
//! ```
//!
//! Each execution runs as its own task, so it settles, clears its pending
//! entry and fills the cache even if every caller stops waiting.

mod connectivity;
mod keys;
mod options;
mod progress;
mod retry;
mod signal;

pub use connectivity::Connectivity;
pub use keys::create_cache_key;
pub use options::RequestOptions;
pub use progress::{Progress, ProgressCallback, ProgressStatus};
pub use retry::{RetryPolicy, RATE_LIMIT_MIN_DELAY};
pub use signal::{AbortController, AbortSignal};

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CacheStore};
use crate::config::{Config, MAX_TIMEOUT};
use crate::error::{RequestError, Result};
use options::{RequestDefaults, ResolvedOptions};
use progress::ProgressReporter;
use retry::execute_with_retry;
use signal::wait_for_abort;

/// Handle onto an in-flight execution, shared by every caller of the same key.
type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T>>>;

/// An in-flight execution: its callers and a type-erased `SharedOutcome<T>`.
struct PendingEntry {
    waiters: Arc<Waiters>,
    outcome: Box<dyn Any + Send + Sync>,
}

/// In-flight executions by request key.
type PendingMap = Mutex<HashMap<String, PendingEntry>>;

/// Callers awaiting one execution.
///
/// The execution is aborted once every caller has aborted. Both the count and
/// the abort only change under the pending map lock.
struct Waiters {
    count: AtomicUsize,
    controller: AbortController,
}

impl Waiters {
    fn new() -> Self {
        Self {
            count: AtomicUsize::new(1),
            controller: AbortController::new(),
        }
    }
}

// == Request Coordinator ==
/// Executes keyed requests with caching, deduplication, timeouts and retries.
///
/// Cloning is cheap; clones share the cache, the pending map and settings.
#[derive(Clone)]
pub struct RequestCoordinator {
    cache: Arc<RwLock<CacheStore>>,
    pending: Arc<PendingMap>,
    connectivity: Connectivity,
    /// Last observed connectivity state
    online: Arc<AtomicBool>,
    default_timeout_ms: Arc<AtomicU64>,
    cache_ttl: Duration,
    retries: u32,
    retry_delay: Duration,
}

impl RequestCoordinator {
    // == Constructor ==
    /// Creates a coordinator using `config` defaults and the given connectivity indicator.
    pub fn new(config: &Config, connectivity: Connectivity) -> Self {
        let online = connectivity.is_online();
        Self {
            cache: Arc::new(RwLock::new(CacheStore::new())),
            pending: Arc::new(Mutex::new(HashMap::new())),
            connectivity,
            online: Arc::new(AtomicBool::new(online)),
            default_timeout_ms: Arc::new(AtomicU64::new(config.default_timeout().as_millis() as u64)),
            cache_ttl: config.cache_ttl(),
            retries: config.max_retries,
            retry_delay: config.retry_delay(),
        }
    }

    // == Request ==
    /// Runs `requester` under the coordinator's policies.
    ///
    /// `requester` may be called up to `retries + 1` times, never concurrently.
    /// Concurrent calls sharing `key` share one execution and its outcome.
    pub async fn request<T, F, Fut>(&self, key: &str, requester: F, options: RequestOptions) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let options = options.resolve(key, &self.defaults());

        debug!(
            "API request: {} (timeout={}ms, cache={}, cache_ttl={}ms, retries={})",
            key,
            options.timeout.as_millis(),
            options.cache,
            options.cache_ttl.as_millis(),
            options.policy.retries
        );

        let reporter = ProgressReporter::new(key, options.on_progress.clone());
        reporter.emit(ProgressStatus::Pending, "Initializing request...", Some(0));

        if key.is_empty() {
            let err = RequestError::invalid_request("Request key cannot be empty");
            reporter.emit(ProgressStatus::Error, err.to_string(), None);
            return Err(err);
        }

        if !self.check_online_status() {
            warn!("Request {} failed: offline", key);
            reporter.emit(ProgressStatus::Offline, "No internet connection", None);
            return Err(RequestError::Offline);
        }

        if options.cache {
            let cached = self.cache.write().await.get::<T>(&options.cache_key);
            if let Some(value) = cached {
                debug!("Cache hit for: {}", options.cache_key);
                reporter.emit(ProgressStatus::Success, "Retrieved from cache", Some(100));
                return Ok(value);
            }
            debug!("Cache miss for: {}", options.cache_key);
        }

        let signal = options.signal.clone();
        if signal.as_ref().is_some_and(AbortSignal::is_aborted) {
            debug!("Request {} aborted before start", key);
            reporter.emit(ProgressStatus::Error, RequestError::Cancelled.to_string(), None);
            return Err(RequestError::Cancelled);
        }

        let (outcome, waiters, joined) =
            match self.join_or_start(key, requester, options, reporter.clone()) {
                Ok(started) => started,
                Err(err) => {
                    reporter.emit(ProgressStatus::Error, err.to_string(), None);
                    return Err(err);
                }
            };

        if joined {
            debug!("Request deduplication for: {}", key);
            reporter.emit(
                ProgressStatus::InProgress,
                "Using existing pending request...",
                Some(50),
            );
        }

        // Each caller honours its own signal, even when joining another's execution
        let result = tokio::select! {
            biased;
            _ = wait_for_abort(signal.as_ref()) => {
                self.abandon(key, &waiters);
                Err(RequestError::Cancelled)
            }
            result = outcome => result,
        };

        match result {
            Ok(value) => {
                reporter.emit(
                    ProgressStatus::Success,
                    "Request completed successfully",
                    Some(100),
                );
                Ok(value)
            }
            Err(err) => {
                reporter.emit(ProgressStatus::Error, err.to_string(), None);
                Err(err)
            }
        }
    }

    /// Returns the pending execution for `key`, starting one if there is none.
    ///
    /// An execution whose callers have all aborted is replaced, not joined.
    /// The boolean is true when an existing execution was joined.
    fn join_or_start<T, F, Fut>(
        &self,
        key: &str,
        requester: F,
        options: ResolvedOptions,
        reporter: ProgressReporter,
    ) -> Result<(SharedOutcome<T>, Arc<Waiters>, bool)>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut pending = lock_pending(&self.pending);

        if let Some(existing) = pending
            .get(key)
            .filter(|entry| !entry.waiters.controller.is_aborted())
        {
            let outcome = (*existing.outcome)
                .downcast_ref::<SharedOutcome<T>>()
                .cloned()
                .ok_or_else(|| {
                    RequestError::Internal(format!(
                        "Pending request {} resolves to a different type",
                        key
                    ))
                })?;
            existing.waiters.count.fetch_add(1, Ordering::Relaxed);
            return Ok((outcome, Arc::clone(&existing.waiters), true));
        }

        let waiters = Arc::new(Waiters::new());
        // Registered before the task starts so its guard always finds the entry
        let guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            key: key.to_string(),
            waiters: Arc::clone(&waiters),
        };
        let outcome = self.spawn_execution(
            key.to_string(),
            requester,
            options,
            waiters.controller.signal(),
            reporter,
            guard,
        );
        pending.insert(
            key.to_string(),
            PendingEntry {
                waiters: Arc::clone(&waiters),
                outcome: Box::new(outcome.clone()),
            },
        );

        Ok((outcome, waiters, false))
    }

    /// Records that one caller of `key` aborted, aborting the execution once none remain.
    fn abandon(&self, key: &str, waiters: &Waiters) {
        let _pending = lock_pending(&self.pending);
        if waiters.count.fetch_sub(1, Ordering::Relaxed) == 1 {
            debug!("Every caller of {} aborted, cancelling execution", key);
            waiters.controller.abort();
        }
    }

    fn spawn_execution<T, F, Fut>(
        &self,
        key: String,
        requester: F,
        options: ResolvedOptions,
        signal: AbortSignal,
        reporter: ProgressReporter,
        guard: PendingGuard,
    ) -> SharedOutcome<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);

        let handle = tokio::spawn(async move {
            let _guard = guard;

            let result = execute_with_retry(
                &key,
                requester,
                options.policy,
                options.timeout,
                &reporter,
                Some(&signal),
            )
            .await;

            if let (true, Ok(value)) = (options.cache, &result) {
                cache
                    .write()
                    .await
                    .insert(options.cache_key.clone(), value.clone(), options.cache_ttl);
                debug!(
                    "Cached result for: {} (TTL: {}ms)",
                    options.cache_key,
                    options.cache_ttl.as_millis()
                );
            }

            result
        });

        async move {
            handle.await.unwrap_or_else(|err| {
                Err(RequestError::Internal(format!("Request task failed: {}", err)))
            })
        }
        .boxed()
        .shared()
    }

    fn defaults(&self) -> RequestDefaults {
        RequestDefaults {
            timeout: self.default_timeout(),
            cache_ttl: self.cache_ttl,
            retries: self.retries,
            retry_delay: self.retry_delay,
        }
    }

    // == Cache Control ==
    /// Removes every cached response.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        info!("Cache cleared");
    }

    /// Removes one cached response, returning true if it existed.
    pub async fn clear_cache_entry(&self, key: &str) -> bool {
        let removed = self.cache.write().await.remove(key);
        debug!("Cache entry cleared: {}", key);
        removed
    }

    /// Returns a snapshot of the response cache.
    pub async fn get_cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Shared handle to the response cache, used by the sweep task.
    pub fn cache(&self) -> Arc<RwLock<CacheStore>> {
        Arc::clone(&self.cache)
    }

    /// Number of executions currently in flight.
    pub fn pending_count(&self) -> usize {
        lock_pending(&self.pending).len()
    }

    // == Connectivity ==
    /// Refreshes the cached connectivity flag from the indicator and returns it.
    pub fn check_online_status(&self) -> bool {
        let online = self.connectivity.is_online();
        self.online.store(online, Ordering::Relaxed);
        online
    }

    /// Last observed connectivity state, without refreshing.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    // == Timeouts ==
    /// Sets the default per-attempt timeout, clamped to [`MAX_TIMEOUT`].
    ///
    /// Returns the timeout actually applied.
    pub fn set_default_timeout(&self, timeout: Duration) -> Duration {
        let effective = timeout.min(MAX_TIMEOUT);
        self.default_timeout_ms
            .store(effective.as_millis() as u64, Ordering::Relaxed);
        info!("Default timeout set to {}ms", effective.as_millis());
        effective
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms.load(Ordering::Relaxed))
    }

    pub fn max_timeout(&self) -> Duration {
        MAX_TIMEOUT
    }
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new(&Config::default(), Connectivity::default())
    }
}

/// Removes a key from the pending map when its execution settles or unwinds.
///
/// A replacement execution registered under the same key is left in place.
struct PendingGuard {
    pending: Arc<PendingMap>,
    key: String,
    waiters: Arc<Waiters>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = lock_pending(&self.pending);
        if pending
            .get(&self.key)
            .is_some_and(|entry| Arc::ptr_eq(&entry.waiters, &self.waiters))
        {
            pending.remove(&self.key);
        }
    }
}

fn lock_pending(pending: &PendingMap) -> MutexGuard<'_, HashMap<String, PendingEntry>> {
    // The map stays consistent even if a holder panicked
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
