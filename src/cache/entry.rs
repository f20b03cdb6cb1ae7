//! Cache Entry Module
//!
//! Defines the structure for individual cached responses with TTL support.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// Type-erased response value shared between the cache and its readers.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

// == Cache Entry ==
/// A single cached response with its creation time and TTL.
///
/// Entries are never mutated in place; a new response replaces the entry.
#[derive(Clone)]
pub struct CacheEntry {
    /// The stored response
    pub data: CachedValue,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Time after which the entry is stale
    pub ttl: Duration,
    /// Monotonic creation instant used for validity checks
    created: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new<T: Send + Sync + 'static>(data: T, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            timestamp: current_timestamp_ms(),
            ttl,
            created: Instant::now(),
        }
    }

    // == Is Expired ==
    /// Checks if the entry is stale at the given instant.
    ///
    /// An entry stays valid while `now - created <= ttl`, so an entry read
    /// exactly at its TTL boundary is still served.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) > self.ttl
    }

    /// Checks if the entry is stale now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Returns how long the entry has been stored.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.created)
    }

    /// Returns the remaining lifetime, zero once stale.
    pub fn ttl_remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.age())
    }

    /// Returns a clone of the stored value if it has type `T`.
    pub fn downcast<T: Clone + 'static>(&self) -> Option<T> {
        self.data.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("timestamp", &self.timestamp)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
