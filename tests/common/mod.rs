//! Shared helpers for the HTTP integration tests.
//!
//! `build_test_app` returns the router together with its state so tests can
//! wait on jobs directly instead of polling over HTTP. `get`, `post_json` and
//! `delete` send one request through `tower::ServiceExt::oneshot` and hand
//! back `(StatusCode, serde_json::Value)`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use primequest::config::ServiceConfig;
use primequest::server::{build_router, AppState};
use std::sync::Arc;
use tower::ServiceExt;

/// A palindromic request that runs for far longer than any test.
pub fn long_running_request() -> serde_json::Value {
    serde_json::json!({"family": "palindromic", "min_digits": 3001})
}

pub fn build_test_app() -> (Router, Arc<AppState>) {
    build_test_app_with(ServiceConfig::default())
}

pub fn build_test_app_with(config: ServiceConfig) -> (Router, Arc<AppState>) {
    let state = AppState::new(config);
    (build_router(Arc::clone(&state)), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::json!(null));
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_empty(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Full response body as text (SSE streams are read to the end).
pub async fn get_text(app: &Router, uri: &str) -> (StatusCode, String, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8_lossy(&body).into_owned())
}

/// The JSON payloads of every `data:` line in an SSE body, in order.
pub fn sse_data(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .filter_map(|data| serde_json::from_str(data.trim()).ok())
        .collect()
}
