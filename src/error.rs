//! # Error — Typed Failures of the Search Service
//!
//! `InvalidInput` is raised synchronously while a request is validated, before
//! any job exists. `PreconditionFailed` is raised by a running search and ends
//! the job with a Failed status. The remaining variants describe misuse of the
//! job controller (unknown id, double start, capacity).
//!
//! Cancellation is not an error: it is a terminal status of the job.

use crate::jobs::JobId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("job {0} is already running")]
    AlreadyRunning(JobId),
    #[error("job {id} cannot be started from status {status}")]
    NotPending { id: JobId, status: String },
    #[error("job {0} has not finished")]
    NotFinished(JobId),
    #[error("maximum of {0} concurrent jobs reached")]
    Busy(usize),
    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SearchError::InvalidInput(msg.into())
    }

    /// Short machine-readable kind, used in wire payloads and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::InvalidInput(_) => "invalid_input",
            SearchError::PreconditionFailed(_) => "precondition_failed",
            SearchError::JobNotFound(_) => "job_not_found",
            SearchError::AlreadyRunning(_) => "already_running",
            SearchError::NotPending { .. } => "not_pending",
            SearchError::NotFinished(_) => "not_finished",
            SearchError::Busy(_) => "busy",
            SearchError::Internal(_) => "internal",
        }
    }
}
