//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, clear_entry_handler, connectivity_handler, fetch_handler,
    get_timeout_handler, health_handler, set_timeout_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /fetch` - GET an upstream URL through the coordinator
/// - `GET /stats` - Cache statistics and in-flight count
/// - `DELETE /cache` - Clear the response cache
/// - `DELETE /cache/:key` - Clear one cached response
/// - `GET /timeout`, `PUT /timeout` - Read or set the default timeout
/// - `PUT /connectivity` - Publish an online/offline event
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/fetch", post(fetch_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/:key", delete(clear_entry_handler))
        .route("/timeout", get(get_timeout_handler).put(set_timeout_handler))
        .route("/connectivity", put(connectivity_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
