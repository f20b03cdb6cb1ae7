//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tokio::time::Instant;
use tracing::info;

use crate::api::upstream;
use crate::config::Config;
use crate::coordinator::{Connectivity, RequestCoordinator};
use crate::error::{RequestError, Result};
use crate::models::{
    ClearResponse, ConnectivityRequest, ConnectivityResponse, FetchRequest, FetchResponse,
    HealthResponse, StatsResponse, TimeoutRequest, TimeoutResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: RequestCoordinator,
    /// Client used for proxied fetches
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(coordinator: RequestCoordinator) -> Self {
        Self {
            coordinator,
            client: reqwest::Client::new(),
        }
    }

    /// Creates a new AppState from configuration, starting online.
    pub fn from_config(config: &Config) -> Self {
        Self::new(RequestCoordinator::new(config, Connectivity::new(true)))
    }
}

/// Handler for POST /fetch
///
/// Runs a GET against the given URL through the coordinator.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Json(req): Json<FetchRequest>,
) -> Result<Json<FetchResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(RequestError::invalid_request(error_msg));
    }

    let key = req.request_key();
    let client = state.client.clone();
    let url = req.url.clone();
    let started = Instant::now();

    let response = state
        .coordinator
        .request(
            &key,
            move || {
                let client = client.clone();
                let url = url.clone();
                async move { upstream::get(&client, &url).await }
            },
            req.options(),
        )
        .await?;

    Ok(Json(FetchResponse {
        key,
        status: response.status,
        body: response.body,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.coordinator.get_cache_stats().await;
    Json(StatsResponse::new(stats, state.coordinator.pending_count()))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.coordinator.clear_cache().await;
    Json(ClearResponse::all())
}

/// Handler for DELETE /cache/:key
pub async fn clear_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ClearResponse> {
    let removed = state.coordinator.clear_cache_entry(&key).await;
    Json(ClearResponse::entry(key, removed))
}

/// Handler for GET /timeout
pub async fn get_timeout_handler(State(state): State<AppState>) -> Json<TimeoutResponse> {
    Json(timeout_response(&state.coordinator))
}

/// Handler for PUT /timeout
///
/// Values above the ceiling are clamped rather than rejected.
pub async fn set_timeout_handler(
    State(state): State<AppState>,
    Json(req): Json<TimeoutRequest>,
) -> Result<Json<TimeoutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(RequestError::invalid_request(error_msg));
    }

    state
        .coordinator
        .set_default_timeout(Duration::from_millis(req.timeout_ms));
    Ok(Json(timeout_response(&state.coordinator)))
}

/// Handler for PUT /connectivity
///
/// Publishes an online/offline event, as a platform network hook would.
pub async fn connectivity_handler(
    State(state): State<AppState>,
    Json(req): Json<ConnectivityRequest>,
) -> Json<ConnectivityResponse> {
    let changed = state.coordinator.connectivity().set_online(req.online);
    if changed {
        info!("Connectivity set to {}", if req.online { "online" } else { "offline" });
    }

    Json(ConnectivityResponse {
        online: state.coordinator.check_online_status(),
        changed,
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.coordinator.check_online_status()))
}

fn timeout_response(coordinator: &RequestCoordinator) -> TimeoutResponse {
    TimeoutResponse {
        default_timeout_ms: coordinator.default_timeout().as_millis() as u64,
        max_timeout_ms: coordinator.max_timeout().as_millis() as u64,
    }
}
