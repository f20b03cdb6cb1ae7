//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for a coordinated fetch (POST /fetch)
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    /// Deduplication key the fetch ran under
    pub key: String,
    /// Upstream HTTP status
    pub status: u16,
    /// Upstream body
    pub body: String,
    /// Time spent in the coordinator, including retries
    pub elapsed_ms: u64,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cached responses
    pub size: usize,
    /// Cached keys, sorted
    pub entries: Vec<String>,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Executions currently in flight
    pub pending: usize,
}

impl StatsResponse {
    pub fn new(stats: CacheStats, pending: usize) -> Self {
        let hit_rate = stats.hit_rate();
        Self {
            size: stats.size,
            entries: stats.entries,
            hits: stats.hits,
            misses: stats.misses,
            expired: stats.expired,
            hit_rate,
            pending,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status ("healthy" or "offline")
    pub status: String,
    pub online: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(online: bool) -> Self {
        Self {
            status: if online { "healthy" } else { "offline" }.to_string(),
            online,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for DELETE /cache and DELETE /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// The cleared key, absent when the whole cache was cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Whether anything was removed
    pub removed: bool,
}

impl ClearResponse {
    pub fn all() -> Self {
        Self {
            message: "Cache cleared".to_string(),
            key: None,
            removed: true,
        }
    }

    pub fn entry(key: impl Into<String>, removed: bool) -> Self {
        let key = key.into();
        let message = if removed {
            format!("Cache entry '{}' cleared", key)
        } else {
            format!("Cache entry '{}' was not present", key)
        };
        Self {
            message,
            key: Some(key),
            removed,
        }
    }
}

/// Response body for GET /timeout and PUT /timeout
#[derive(Debug, Clone, Serialize)]
pub struct TimeoutResponse {
    pub default_timeout_ms: u64,
    pub max_timeout_ms: u64,
}

/// Response body for PUT /connectivity
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityResponse {
    pub online: bool,
    /// Whether the call changed the state
    pub changed: bool,
}
