//! Request Coordinator - resilient execution of keyed async work
//!
//! Wraps outbound calls with offline detection, TTL response caching,
//! in-flight deduplication, timeouts and exponential backoff retry.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use coordinator::{
    create_cache_key, AbortController, AbortSignal, Connectivity, Progress, ProgressCallback,
    ProgressStatus, RequestCoordinator, RequestOptions,
};
pub use error::{ErrorKind, RequestError, Result};
pub use tasks::BackgroundTasks;
