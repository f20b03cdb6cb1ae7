//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for each endpoint, with a local
//! upstream server standing in for the remote API.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use request_coordinator::{api::create_router, AppState, Config};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> (Router, AppState) {
    let state = AppState::from_config(&Config::default());
    (create_router(state.clone()), state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Upstream that answers 503 on its first two hits and 200 afterwards,
/// plus a route that always rejects the caller's credentials.
async fn spawn_upstream() -> (SocketAddr, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let flaky_hits = Arc::new(AtomicUsize::new(0));
    let auth_hits = Arc::new(AtomicUsize::new(0));

    async fn flaky(State(hits): State<Arc<AtomicUsize>>) -> (StatusCode, String) {
        if hits.fetch_add(1, Ordering::SeqCst) < 2 {
            (StatusCode::SERVICE_UNAVAILABLE, "warming up".to_string())
        } else {
            (StatusCode::OK, "hello".to_string())
        }
    }

    async fn denied(State(hits): State<Arc<AtomicUsize>>) -> (StatusCode, String) {
        hits.fetch_add(1, Ordering::SeqCst);
        (StatusCode::UNAUTHORIZED, "Invalid API key".to_string())
    }

    let app = Router::new()
        .route("/flaky", get(flaky).with_state(Arc::clone(&flaky_hits)))
        .route("/denied", get(denied).with_state(Arc::clone(&auth_hits)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, flaky_hits, auth_hits)
}

// == Fetch Endpoint Tests ==

#[tokio::test]
async fn test_fetch_retries_transient_upstream_failures() {
    let (addr, flaky_hits, _) = spawn_upstream().await;
    let (app, _) = create_test_app();

    let body = format!(
        r#"{{"url":"http://{}/flaky","key":"greeting","retries":2,"retry_delay_ms":10}}"#,
        addr
    );
    let response = app.oneshot(json_request("POST", "/fetch", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "greeting");
    assert_eq!(json["status"], 200);
    assert_eq!(json["body"], "hello");
    assert_eq!(flaky_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_fetch_exhausted_retries_returns_bad_gateway() {
    let (addr, flaky_hits, _) = spawn_upstream().await;
    let (app, _) = create_test_app();

    let body = format!(
        r#"{{"url":"http://{}/flaky","retries":1,"retry_delay_ms":10}}"#,
        addr
    );
    let response = app.oneshot(json_request("POST", "/fetch", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["kind"], "server_unavailable");
    assert_eq!(flaky_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fetch_auth_failure_is_not_retried() {
    let (addr, _, auth_hits) = spawn_upstream().await;
    let (app, _) = create_test_app();

    let body = format!(
        r#"{{"url":"http://{}/denied","retries":3,"retry_delay_ms":10}}"#,
        addr
    );
    let response = app.oneshot(json_request("POST", "/fetch", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["kind"], "auth");
    assert_eq!(auth_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetch_served_from_cache() {
    let (addr, flaky_hits, _) = spawn_upstream().await;
    let (app, _) = create_test_app();

    let body = format!(
        r#"{{"url":"http://{}/flaky","key":"greeting","cache":true,"retry_delay_ms":10}}"#,
        addr
    );

    let first = app
        .clone()
        .oneshot(json_request("POST", "/fetch", body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(json_request("POST", "/fetch", body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let json = body_to_json(second.into_body()).await;
    assert_eq!(json["body"], "hello");
    assert_eq!(flaky_hits.load(Ordering::SeqCst), 3);

    let stats = app.oneshot(empty_request("GET", "/stats")).await.unwrap();
    let json = body_to_json(stats.into_body()).await;
    assert_eq!(json["size"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["entries"][0], "greeting");
    assert_eq!(json["pending"], 0);
}

#[tokio::test]
async fn test_fetch_offline_returns_service_unavailable() {
    let (app, _) = create_test_app();

    let offline = app
        .clone()
        .oneshot(json_request("PUT", "/connectivity", r#"{"online":false}"#.to_string()))
        .await
        .unwrap();
    assert_eq!(offline.status(), StatusCode::OK);
    let json = body_to_json(offline.into_body()).await;
    assert_eq!(json["online"], false);
    assert_eq!(json["changed"], true);

    let response = app
        .oneshot(json_request(
            "POST",
            "/fetch",
            r#"{"url":"http://127.0.0.1:9/never"}"#.to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["kind"], "offline");
    assert!(json["error"].as_str().unwrap().contains("No internet connection"));
}

#[tokio::test]
async fn test_fetch_invalid_url() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(json_request("POST", "/fetch", r#"{"url":"ftp://host/file"}"#.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["kind"], "validation");
}

#[tokio::test]
async fn test_fetch_rejects_unbounded_retries() {
    let (addr, flaky_hits, _) = spawn_upstream().await;
    let (app, state) = create_test_app();

    let body = format!(
        r#"{{"url":"http://{}/flaky","retries":4294967295}}"#,
        addr
    );
    let response = app.oneshot(json_request("POST", "/fetch", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["kind"], "validation");
    assert_eq!(flaky_hits.load(Ordering::SeqCst), 0);
    assert_eq!(state.coordinator.pending_count(), 0);
}

// == Cache Endpoint Tests ==

#[tokio::test]
async fn test_clear_cache_entry_and_all() {
    let (addr, _, _) = spawn_upstream().await;
    let (app, state) = create_test_app();

    let body = format!(
        r#"{{"url":"http://{}/flaky","key":"greeting","cache":true,"retry_delay_ms":10}}"#,
        addr
    );
    app.clone()
        .oneshot(json_request("POST", "/fetch", body))
        .await
        .unwrap();
    assert_eq!(state.coordinator.get_cache_stats().await.size, 1);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/cache/greeting"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], true);
    assert_eq!(state.coordinator.get_cache_stats().await.size, 0);

    let response = app.oneshot(empty_request("DELETE", "/cache")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// == Timeout Endpoint Tests ==

#[tokio::test]
async fn test_timeout_get_and_set() {
    let (app, _) = create_test_app();

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/timeout"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["default_timeout_ms"], 30_000);
    assert_eq!(json["max_timeout_ms"], 120_000);

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/timeout", r#"{"timeout_ms":5000}"#.to_string()))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["default_timeout_ms"], 5000);

    let response = app
        .oneshot(json_request("PUT", "/timeout", r#"{"timeout_ms":500000}"#.to_string()))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["default_timeout_ms"], 120_000);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["online"], true);
    assert!(json.get("timestamp").is_some());
}
