//! API Module
//!
//! HTTP handlers and routing for the coordinator admin API.
//!
//! # Endpoints
//! - `POST /fetch` - GET an upstream URL through the coordinator
//! - `GET /stats` - Cache statistics
//! - `DELETE /cache`, `DELETE /cache/:key` - Cache control
//! - `GET /timeout`, `PUT /timeout` - Default timeout
//! - `PUT /connectivity` - Online/offline events
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;
pub mod upstream;

pub use handlers::*;
pub use routes::create_router;
