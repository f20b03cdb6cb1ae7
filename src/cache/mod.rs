//! Cache Module
//!
//! Provides the in-memory response cache with per-entry TTL expiration.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, CachedValue};
pub use stats::CacheStats;
pub use store::CacheStore;
