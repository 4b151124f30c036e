//! # Health & Observability Endpoints
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /healthz` | Liveness: the process is serving HTTP |
//! | `GET /metrics` | Prometheus scraping endpoint |
//! | `GET /api/status` | Job counts and effective settings |

use super::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(super) async fn handler_healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(super) async fn handler_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.jobs.metrics().encode();
    (
        StatusCode::OK,
        [(
            "content-type",
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
}

pub(super) async fn handler_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
    for snapshot in state.jobs.list() {
        *by_status.entry(snapshot.status.as_str()).or_default() += 1;
    }
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "active_jobs": state.jobs.active_jobs(),
        "jobs": by_status,
        "max_active_jobs": state.config.jobs.max_active_jobs,
        "retain_finished": state.config.jobs.retain_finished,
        "primality_rounds": state.config.primality.rounds,
    }))
}
