//! # Family Endpoints — One-Shot Default Searches
//!
//! `/q1` streams the default Kaprekar job as it runs. `/q2` through `/q7`
//! run one family each with default parameters and answer with the compact
//! terminal payload once the job ends. In both cases the job is acknowledged
//! once its terminal payload is out, and a client that disconnects early
//! cancels it. The handlers subscribe before the worker starts, so retention
//! evicting a fast job never loses its result.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use super::{job_event_stream, ApiError, AppState, CancelOnDrop, StreamKind};
use crate::error::SearchError;
use crate::events::{terminal_payload, JobEvent};
use crate::jobs::{wait_terminal, JobStatus};
use crate::search_params::Family;

/// Compact progress frames `{current_index, elapsed_seconds}`, then the
/// flattened terminal payload. Progress is sampled from the job's latest
/// snapshot: a client reading slower than candidates are tested skips
/// intermediate indices, though frames never arrive out of order.
pub(super) async fn handler_q1(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let (started, rx) = state
        .jobs
        .submit_watched(Family::Kaprekar.default_request())?;
    Ok(job_event_stream(state.jobs.clone(), started.id, rx, StreamKind::Compact).into_response())
}

/// Submit, wait for the terminal status, acknowledge.
async fn run_to_completion(state: &AppState, family: Family) -> Result<Response, ApiError> {
    let (started, rx) = state.jobs.submit_watched(family.default_request())?;
    let id = started.id;
    let mut guard = CancelOnDrop::new(state.jobs.clone(), id);
    let snapshot = wait_terminal(rx).await?;
    guard.disarm();
    guard.acknowledge();

    let status = if snapshot.status == JobStatus::Failed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    let payload = match JobEvent::from_snapshot(&snapshot) {
        Some(JobEvent::Terminal(t)) => terminal_payload(&t),
        _ => {
            return Err(ApiError(SearchError::Internal(format!(
                "job {} ended without a terminal status",
                id
            ))))
        }
    };
    Ok((status, Json(payload)).into_response())
}

pub(super) async fn handler_q2(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    run_to_completion(&state, Family::Repunit).await
}

pub(super) async fn handler_q3(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    run_to_completion(&state, Family::Mersenne).await
}

pub(super) async fn handler_q4(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    run_to_completion(&state, Family::BetweenSquares).await
}

pub(super) async fn handler_q5(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    run_to_completion(&state, Family::Palindromic).await
}

pub(super) async fn handler_q6(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    run_to_completion(&state, Family::Perfect).await
}

pub(super) async fn handler_q7(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    run_to_completion(&state, Family::Goldbach).await
}
