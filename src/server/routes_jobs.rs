//! Job API: create, poll, start, cancel, acknowledge and stream search jobs.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{job_event_stream, ApiError, AppState, StreamKind};
use crate::error::SearchError;
use crate::jobs::JobId;
use crate::search_params::SearchRequest;

#[derive(Deserialize)]
pub(super) struct CreateQuery {
    #[serde(default = "default_start")]
    start: bool,
}

fn default_start() -> bool {
    true
}

pub(super) async fn handler_jobs_list(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "jobs": state.jobs.list() }))
}

pub(super) async fn handler_jobs_create(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CreateQuery>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| SearchError::invalid(e.body_text()))?;
    // The snapshot comes from the call that made the job: a fast job may be
    // finished and evicted before a separate lookup could run.
    let snapshot = if query.start {
        state.jobs.submit(request)?
    } else {
        let id = state.jobs.create(request)?;
        state.jobs.snapshot(id)?
    };
    Ok((StatusCode::CREATED, Json(snapshot)).into_response())
}

pub(super) async fn handler_job_get(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<JobId>,
) -> Result<Response, ApiError> {
    Ok(Json(state.jobs.snapshot(id)?).into_response())
}

pub(super) async fn handler_job_start(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<JobId>,
) -> Result<Response, ApiError> {
    Ok(Json(state.jobs.start(id)?).into_response())
}

pub(super) async fn handler_job_cancel(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<JobId>,
) -> Result<Response, ApiError> {
    Ok(Json(state.jobs.cancel(id)?).into_response())
}

pub(super) async fn handler_job_acknowledge(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<JobId>,
) -> Result<Response, ApiError> {
    Ok(Json(state.jobs.acknowledge(id)?).into_response())
}

/// Full-form events (`progress`, then `terminal`). Disconnecting before the
/// terminal event cancels the job.
pub(super) async fn handler_job_events(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<JobId>,
) -> Result<Response, ApiError> {
    let rx = state.jobs.subscribe(id)?;
    Ok(job_event_stream(state.jobs.clone(), id, rx, StreamKind::Full).into_response())
}
