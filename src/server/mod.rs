//! # Server — HTTP Surface of the Search Service
//!
//! Runs an Axum HTTP server over a shared [`JobController`].
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /q1` | Default Kaprekar search streamed as server-sent events |
//! | `GET /q2` … `/q7` | Default repunit, Mersenne, between-squares, palindromic, perfect, Goldbach searches run to completion |
//! | `POST /api/jobs`, `GET /api/jobs` | Create (and by default start) a job; list jobs |
//! | `GET /api/jobs/{id}`, `DELETE /api/jobs/{id}` | Poll a job; acknowledge a finished one |
//! | `POST /api/jobs/{id}/start`, `POST /api/jobs/{id}/cancel` | Start a pending job; request cancellation |
//! | `GET /api/jobs/{id}/events` | Progress and terminal events as server-sent events |
//! | `GET /healthz`, `GET /metrics`, `GET /api/status` | Liveness, Prometheus exposition, service status |
//!
//! Every request runs inside a `request` span carrying an `x-request-id`
//! (taken from the request or generated), echoed back on the response.
//! Dropping an event stream (client disconnect) cancels the job behind it.

mod routes_families;
mod routes_health;
mod routes_jobs;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn, Instrument};

use crate::config::ServiceConfig;
use crate::error::SearchError;
use crate::events::{EventSequencer, JobEvent};
use crate::jobs::{JobController, JobId, JobSnapshot};

const MAX_BODY_BYTES: usize = 64 * 1024;

pub struct AppState {
    pub jobs: JobController,
    pub config: ServiceConfig,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Arc<Self> {
        let jobs = JobController::new(config.tester(), config.job_settings());
        Arc::new(AppState { jobs, config })
    }
}

/// `SearchError` rendered as `{"error": ..., "kind": ...}` with a matching status.
pub struct ApiError(pub SearchError);

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        ApiError(e)
    }
}

pub fn status_for(e: &SearchError) -> StatusCode {
    match e {
        SearchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SearchError::JobNotFound(_) => StatusCode::NOT_FOUND,
        SearchError::AlreadyRunning(_)
        | SearchError::NotPending { .. }
        | SearchError::NotFinished(_) => StatusCode::CONFLICT,
        SearchError::Busy(_) => StatusCode::TOO_MANY_REQUESTS,
        SearchError::PreconditionFailed(_) | SearchError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        (
            status,
            Json(json!({"error": self.0.to_string(), "kind": self.0.kind()})),
        )
            .into_response()
    }
}

/// Cancels its job when dropped while armed: a client that goes away stops
/// the search it was waiting on.
pub(crate) struct CancelOnDrop {
    jobs: JobController,
    id: JobId,
    armed: bool,
}

impl CancelOnDrop {
    pub(crate) fn new(jobs: JobController, id: JobId) -> Self {
        CancelOnDrop {
            jobs,
            id,
            armed: true,
        }
    }

    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    /// Remove the finished job. Retention may already have evicted it.
    pub(crate) fn acknowledge(&self) {
        if let Err(e) = self.jobs.acknowledge(self.id) {
            debug!(job_id = self.id, error = %e, "job already evicted");
        }
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            info!(job_id = self.id, "client disconnected, cancelling job");
            if let Err(e) = self.jobs.cancel(self.id) {
                warn!(job_id = self.id, error = %e, "cancel on disconnect failed");
            }
        }
    }
}

/// Rendering of a job's event stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StreamKind {
    /// Tagged `progress`/`terminal` events. The job stays in the controller.
    Full,
    /// `{current_index, elapsed_seconds}` progress and the flattened terminal
    /// payload. The job is acknowledged once the terminal event is out.
    Compact,
}

struct StreamState {
    rx: watch::Receiver<JobSnapshot>,
    sequencer: EventSequencer,
    guard: CancelOnDrop,
    kind: StreamKind,
    first: bool,
}

/// Server-sent events for one job: progress events in sequence order, then
/// the terminal event, then end of stream.
///
/// Snapshots are read from a `watch` channel, so a consumer slower than the
/// search gets the latest progress rather than every candidate.
pub(crate) fn job_event_stream(
    jobs: JobController,
    id: JobId,
    rx: watch::Receiver<JobSnapshot>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let state = StreamState {
        rx,
        sequencer: EventSequencer::new(),
        guard: CancelOnDrop::new(jobs, id),
        kind,
        first: true,
    };
    let stream = futures::stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        loop {
            if !state.first && state.rx.changed().await.is_err() {
                return None;
            }
            state.first = false;
            let snapshot = state.rx.borrow_and_update().clone();
            let Some(event) = JobEvent::from_snapshot(&snapshot) else {
                continue;
            };
            if !state.sequencer.accept(&event) {
                continue;
            }
            let payload = match state.kind {
                StreamKind::Compact => event.to_compact_json(),
                StreamKind::Full => event.to_json(),
            };
            let sse = Event::default()
                .event(event.name())
                .id(event.sequence().to_string())
                .data(payload.to_string());
            if event.is_terminal() {
                state.guard.disarm();
                if state.kind == StreamKind::Compact {
                    state.guard.acknowledge();
                }
                return Some((Ok(sse), None));
            }
            return Some((Ok(sse), Some(state)));
        }
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

/// Tag each request with an id and run it inside a `request` span.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/q1", get(routes_families::handler_q1))
        .route("/q2", get(routes_families::handler_q2))
        .route("/q3", get(routes_families::handler_q3))
        .route("/q4", get(routes_families::handler_q4))
        .route("/q5", get(routes_families::handler_q5))
        .route("/q6", get(routes_families::handler_q6))
        .route("/q7", get(routes_families::handler_q7))
        .route(
            "/api/jobs",
            get(routes_jobs::handler_jobs_list).post(routes_jobs::handler_jobs_create),
        )
        .route(
            "/api/jobs/{id}",
            get(routes_jobs::handler_job_get).delete(routes_jobs::handler_job_acknowledge),
        )
        .route("/api/jobs/{id}/start", post(routes_jobs::handler_job_start))
        .route("/api/jobs/{id}/cancel", post(routes_jobs::handler_job_cancel))
        .route("/api/jobs/{id}/events", get(routes_jobs::handler_job_events))
        .route("/api/status", get(routes_health::handler_status))
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/metrics", get(routes_health::handler_metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

pub async fn run(config: ServiceConfig) -> Result<()> {
    let addr = config.bind_address();
    let state = AppState::new(config);
    let app = build_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(
        addr = %addr,
        rounds = state.config.primality.rounds,
        max_active_jobs = state.config.jobs.max_active_jobs,
        "search service listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "could not install SIGTERM handler");
                ctrl_c.await.ok();
                info!("received SIGINT, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT, shutting down");
    }
}
