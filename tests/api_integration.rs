//! API integration tests for the primequest Axum endpoints.
//!
//! Requests go through `tower::ServiceExt::oneshot` straight into the router,
//! without a TCP listener. Each test builds its own `AppState`, so jobs never
//! leak between tests.
//!
//! # How to run
//!
//! ```bash
//! cargo test --test api_integration
//! ```
//!
//! # Testing strategy
//!
//! Grouped by surface: health and metrics, the job API (create, poll, start,
//! cancel, acknowledge, capacity), the event stream, and the one-shot family
//! endpoints. Searches use small parameters so every job finishes in well
//! under a second, except the deliberately long palindromic request used to
//! exercise cancellation.

mod common;

use axum::http::StatusCode;
use common::{delete, get, get_text, long_running_request, post_empty, post_json, sse_data};
use http_body_util::BodyExt;
use primequest::config::ServiceConfig;
use primequest::jobs::JobStatus;
use serde_json::json;
use std::time::Duration;

// == Health & Metrics ==========================================================

#[tokio::test]
async fn healthz_returns_ok() {
    let (app, _) = common::build_test_app();
    let (status, _, body) = get_text(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let (app, _) = common::build_test_app();
    let request = axum::http::Request::builder()
        .uri("/healthz")
        .header("x-request-id", "abc-123")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn metrics_count_started_jobs() {
    let (app, state) = common::build_test_app();
    let (status, body) =
        post_json(&app, "/api/jobs", json!({"family": "goldbach", "numbers": ["100"]})).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_u64().unwrap();
    state.jobs.wait(id).await.unwrap();

    let (status, content_type, text) = get_text(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("application/openmetrics-text"));
    assert!(text.contains("primequest_jobs_started_total{family=\"goldbach\"} 1"));
    assert!(text.contains("primequest_jobs_finished_total"));
}

#[tokio::test]
async fn status_reports_settings() {
    let (app, _) = common::build_test_app();
    let (status, body) = get(&app, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_jobs"], 0);
    assert_eq!(body["max_active_jobs"], 4);
    assert_eq!(body["primality_rounds"], 25);
}

// == Job API ===================================================================

#[tokio::test]
async fn create_and_poll_goldbach_job() {
    let (app, state) = common::build_test_app();
    let (status, body) = post_json(
        &app,
        "/api/jobs",
        json!({"family": "goldbach", "numbers": ["100", "128"]}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["family"], "goldbach");
    let id = body["id"].as_u64().unwrap();
    state.jobs.wait(id).await.unwrap();

    let (status, body) = get(&app, &format!("/api/jobs/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "found");
    let decompositions = &body["result"]["decompositions"];
    assert_eq!(decompositions[0]["pair"], json!(["3", "97"]));
    assert_eq!(decompositions[1]["pair"], json!(["19", "109"]));
}

#[tokio::test]
async fn create_returns_job_even_when_finished_jobs_are_not_retained() {
    let mut config = ServiceConfig::default();
    config.jobs.retain_finished = 0;
    config.jobs.max_active_jobs = 256;
    let (app, _) = common::build_test_app_with(config);
    for _ in 0..200 {
        let (status, body) =
            post_json(&app, "/api/jobs", json!({"family": "goldbach", "numbers": ["4"]})).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert!(body["id"].is_u64());
        assert_eq!(body["status"], "running");
    }
}

#[tokio::test]
async fn composite_perfect_exponent_reports_failed() {
    let (app, state) = common::build_test_app();
    let (status, body) =
        post_json(&app, "/api/jobs", json!({"family": "perfect", "exponents": [2, 11]})).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_u64().unwrap();
    state.jobs.wait(id).await.unwrap();

    let (status, body) = get(&app, &format!("/api/jobs/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["reason"], "precondition failed: 2^11 - 1 is not prime");
    assert!(body["result"].is_null());
}

#[tokio::test]
async fn invalid_goldbach_target_is_bad_request() {
    let (app, state) = common::build_test_app();
    let (status, body) =
        post_json(&app, "/api/jobs", json!({"family": "goldbach", "numbers": ["7"]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
    assert!(body["error"].as_str().unwrap().contains("even"));
    assert!(state.jobs.list().is_empty());
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (app, _) = common::build_test_app();
    let (status, body) = post_json(&app, "/api/jobs", json!({"family": "fermat"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (status, _) = post_json(
        &app,
        "/api/jobs",
        json!({"family": "repunit", "bound": 5000}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let (app, _) = common::build_test_app();
    let (status, body) = get(&app, "/api/jobs/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "job_not_found");

    assert_eq!(post_empty(&app, "/api/jobs/999/start").await.0, StatusCode::NOT_FOUND);
    assert_eq!(post_empty(&app, "/api/jobs/999/cancel").await.0, StatusCode::NOT_FOUND);
    assert_eq!(delete(&app, "/api/jobs/999").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pending_job_starts_on_request() {
    let (app, state) = common::build_test_app();
    let (status, body) = post_json(
        &app,
        "/api/jobs?start=false",
        json!({"family": "repunit", "bound": 23}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    let id = body["id"].as_u64().unwrap();

    let (status, body) = post_empty(&app, &format!("/api/jobs/{}/start", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");

    let done = state.jobs.wait(id).await.unwrap();
    let (status, body) = post_empty(&app, &format!("/api/jobs/{}/start", id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "not_pending");

    let (_, body) = get(&app, &format!("/api/jobs/{}", id)).await;
    assert_eq!(body["sequence"], done.sequence);
    let ns: Vec<u64> = body["result"]["repunit_primes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["n"].as_u64().unwrap())
        .collect();
    assert_eq!(ns, vec![2, 19, 23]);
}

#[tokio::test]
async fn cancel_then_acknowledge() {
    let (app, state) = common::build_test_app();
    let (_, body) = post_json(&app, "/api/jobs", long_running_request()).await;
    let id = body["id"].as_u64().unwrap();

    let (status, body) = post_empty(&app, &format!("/api/jobs/{}/start", id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "already_running");

    let (status, body) = delete(&app, &format!("/api/jobs/{}", id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "not_finished");

    let (status, _) = post_empty(&app, &format!("/api/jobs/{}/cancel", id)).await;
    assert_eq!(status, StatusCode::OK);
    let done = state.jobs.wait(id).await.unwrap();
    assert_eq!(done.status.as_str(), "cancelled");
    assert!(done.result.is_none());

    let (status, body) = delete(&app, &format!("/api/jobs/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(get(&app, &format!("/api/jobs/{}", id)).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn capacity_limit_is_too_many_requests() {
    let mut config = ServiceConfig::default();
    config.jobs.max_active_jobs = 1;
    let (app, state) = common::build_test_app_with(config);

    let (status, body) = post_json(&app, "/api/jobs", long_running_request()).await;
    assert_eq!(status, StatusCode::CREATED);
    let first = body["id"].as_u64().unwrap();

    let (status, body) = post_json(&app, "/api/jobs", long_running_request()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["kind"], "busy");

    state.jobs.cancel(first).unwrap();
    state.jobs.wait(first).await.unwrap();
    let (status, body) = post_json(&app, "/api/jobs", long_running_request()).await;
    assert_eq!(status, StatusCode::CREATED);
    let second = body["id"].as_u64().unwrap();
    state.jobs.cancel(second).unwrap();
    state.jobs.wait(second).await.unwrap();
}

#[tokio::test]
async fn list_is_ordered_by_id() {
    let (app, state) = common::build_test_app();
    for _ in 0..3 {
        post_json(
            &app,
            "/api/jobs?start=false",
            json!({"family": "perfect", "exponents": [2, 3]}),
        )
        .await;
    }
    let (status, body) = get(&app, "/api/jobs").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(state.jobs.active_jobs(), 0);
}

// == Event Stream ==============================================================

#[tokio::test]
async fn events_of_finished_job_are_single_terminal() {
    let (app, state) = common::build_test_app();
    let (_, body) =
        post_json(&app, "/api/jobs", json!({"family": "goldbach", "numbers": ["100"]})).await;
    let id = body["id"].as_u64().unwrap();
    state.jobs.wait(id).await.unwrap();

    let (status, content_type, text) = get_text(&app, &format!("/api/jobs/{}/events", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/event-stream"));
    assert!(text.contains("event: terminal"));
    let events = sse_data(&text);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "terminal");
    assert_eq!(events[0]["status"], "found");
}

#[tokio::test]
async fn events_stream_progress_then_terminal() {
    let (app, _) = common::build_test_app();
    let (_, body) = post_json(
        &app,
        "/api/jobs?start=false",
        json!({"family": "mersenne", "min_exp": 2, "max_exp": 130}),
    )
    .await;
    let id = body["id"].as_u64().unwrap();

    let response = tower::ServiceExt::oneshot(
        app.clone(),
        axum::http::Request::builder()
            .uri(format!("/api/jobs/{}/events", id))
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(post_empty(&app, &format!("/api/jobs/{}/start", id)).await.0, StatusCode::OK);

    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    let events = sse_data(&String::from_utf8_lossy(&bytes));
    let last = events.last().unwrap();
    assert_eq!(last["type"], "terminal");
    assert_eq!(last["status"], "found");
    let sequences: Vec<u64> = events
        .iter()
        .map(|e| e["sequence"].as_u64().unwrap())
        .collect();
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    assert!(events[..events.len() - 1]
        .iter()
        .all(|e| e["type"] == "progress"));
}

#[tokio::test]
async fn events_for_unknown_job_is_not_found() {
    let (app, _) = common::build_test_app();
    assert_eq!(get(&app, "/api/jobs/5/events").await.0, StatusCode::NOT_FOUND);
}

// == Family Endpoints ==========================================================

#[tokio::test]
async fn q1_streams_compact_progress_and_cancels_on_disconnect() {
    let (app, state) = common::build_test_app();
    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/q1")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(60), body.frame())
        .await
        .expect("no event within timeout")
        .unwrap()
        .unwrap();
    let text = String::from_utf8_lossy(frame.data_ref().unwrap()).into_owned();
    assert!(text.contains("event: progress"), "{}", text);
    let progress = &sse_data(&text)[0];
    assert!(progress["current_index"].is_u64(), "{}", progress);
    assert!(progress["elapsed_seconds"].is_number());
    assert_eq!(progress.as_object().unwrap().len(), 2);

    let id = state.jobs.list()[0].id;
    drop(body);
    let done = tokio::time::timeout(Duration::from_secs(60), state.jobs.wait(id))
        .await
        .expect("job not cancelled within timeout")
        .unwrap();
    assert_eq!(done.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn family_endpoint_answers_with_zero_retention() {
    let mut config = ServiceConfig::default();
    config.jobs.retain_finished = 0;
    let (app, state) = common::build_test_app_with(config);
    for _ in 0..20 {
        let (status, body) = get(&app, "/q7").await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["found"], true);
    }
    assert!(state.jobs.list().is_empty());
}

#[tokio::test]
async fn q6_returns_default_perfect_numbers() {
    let (app, state) = common::build_test_app();
    let (status, body) = get(&app, "/q6").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "found");
    assert_eq!(body["found"], true);
    let numbers = body["perfect_numbers"].as_array().unwrap();
    assert_eq!(numbers[0]["p"], 2203);
    assert_eq!(numbers[0]["digits"], 1327);
    assert_eq!(numbers[1]["digits"], 1373);
    assert!(body["elapsed_seconds"].is_number());
    assert!(state.jobs.list().is_empty());
}

#[tokio::test]
async fn q7_decomposes_default_targets() {
    let (app, _) = common::build_test_app();
    let (status, body) = get(&app, "/q7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], true);
    let decompositions = body["decompositions"].as_array().unwrap();
    assert_eq!(decompositions.len(), 2);
    for d in decompositions {
        let n: rug::Integer = d["number"].as_str().unwrap().parse().unwrap();
        let p: rug::Integer = d["pair"][0].as_str().unwrap().parse().unwrap();
        let q: rug::Integer = d["pair"][1].as_str().unwrap().parse().unwrap();
        assert_eq!(p + q, n);
    }
}
