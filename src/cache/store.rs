//! Cache Store Module
//!
//! Response cache keyed by string, with lazy and periodic TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};

// == Cache Store ==
/// In-memory response cache with per-entry TTL.
///
/// Values of any `Send + Sync` type can be stored; a lookup with a different
/// type than the one stored counts as a miss.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Usage counters
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty CacheStore.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Stores a value under `key`, replacing any previous entry and resetting its TTL.
    pub fn insert<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, data: T, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(data, ttl));
    }

    // == Get ==
    /// Retrieves a clone of the value stored under `key`.
    ///
    /// Stale entries are removed and reported as misses.
    pub fn get<T: Clone + 'static>(&mut self, key: &str) -> Option<T> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if entry.is_expired() {
            self.entries.remove(key);
            self.stats.record_expired(1);
            self.stats.record_miss();
            debug!("Cache entry expired: {}", key);
            return None;
        }

        match entry.downcast::<T>() {
            Some(value) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                debug!("Cache entry {} holds a different type, ignoring", key);
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns true if a valid entry exists for `key`. Does not touch the counters.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Remove ==
    /// Removes one entry, returning true if it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry unconditionally.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Stats ==
    /// Returns a snapshot of the cache.
    pub fn stats(&self) -> CacheStats {
        let mut entries: Vec<String> = self.entries.keys().cloned().collect();
        entries.sort();

        CacheStats {
            size: self.entries.len(),
            entries,
            ..self.stats.clone()
        }
    }

    // == Cleanup Expired ==
    /// Removes all stale entries, returning the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - self.entries.len();
        self.stats.record_expired(removed);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
