//! # Jobs — Controller for Long-Running Searches
//!
//! The controller owns every job in an arena keyed by [`JobId`]. A job's whole
//! observable state is a [`JobSnapshot`] held in a `tokio::sync::watch`
//! channel: the worker replaces fields inside `send_modify`, so pollers and
//! stream subscribers always read a consistent snapshot, and a subscriber that
//! falls behind simply sees the latest one.
//!
//! ## Lifecycle
//!
//! ```text
//! pending ──start──▶ running ──▶ found | exhausted | cancelled | failed
//!    └──────cancel──────────────────────────────▶ cancelled
//! ```
//!
//! - `start` runs a job at most once: `AlreadyRunning` while it runs,
//!   `NotPending` once it has finished, `Busy` when `max_active_jobs` are
//!   already running.
//! - Each job runs on its own OS thread named `search-job-<id>`. A panic in
//!   the search is caught and becomes a Failed status carrying the message.
//! - `cancel` raises the job's stop flag. The search checks it before every
//!   candidate; a result computed after the flag was raised is discarded.
//! - The terminal transition bumps the sequence one last time and nothing is
//!   published after it.
//! - `acknowledge` removes a terminal job. Beyond `retain_finished` terminal
//!   jobs, the oldest are evicted; with `retain_finished = 0` a job leaves the
//!   arena as soon as it ends.
//! - Eviction never costs a caller its result: `submit` hands back the
//!   snapshot that `start` published, and `submit_watched` subscribes before
//!   the worker exists, so the terminal snapshot reaches that receiver even
//!   if the job is gone from the arena by the time it is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::SearchError;
use crate::outcome::{Candidate, Outcome, SearchResult};
use crate::primality::PrimalityTester;
use crate::prom_metrics::Metrics;
use crate::search_params::{Family, SearchRequest};
use crate::{run_search, SearchMonitor};

pub type JobId = u64;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Found,
    Exhausted,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Found => "found",
            JobStatus::Exhausted => "exhausted",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobSettings {
    pub max_active_jobs: usize,
    pub retain_finished: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        JobSettings {
            max_active_jobs: 4,
            retain_finished: 64,
        }
    }
}

/// Everything a caller can observe about a job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub family: Family,
    pub request: SearchRequest,
    pub status: JobStatus,
    /// Bumped on every published change; strictly increasing per job.
    pub sequence: u64,
    pub tested: u64,
    pub current: Option<Candidate>,
    pub elapsed_seconds: f64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<SearchResult>,
    pub reason: Option<String>,
}

impl JobSnapshot {
    fn pending(id: JobId, request: SearchRequest) -> Self {
        JobSnapshot {
            id,
            family: request.family(),
            request,
            status: JobStatus::Pending,
            sequence: 0,
            tested: 0,
            current: None,
            elapsed_seconds: 0.0,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
            reason: None,
        }
    }
}

struct JobSlot {
    state: Arc<watch::Sender<JobSnapshot>>,
    cancel: Arc<AtomicBool>,
    started: Option<Instant>,
}

struct Shared {
    jobs: Mutex<HashMap<JobId, JobSlot>>,
    next_id: AtomicU64,
    active: AtomicUsize,
    tester: PrimalityTester,
    settings: JobSettings,
    metrics: Arc<Metrics>,
}

/// Cheap to clone; clones share the same arena.
#[derive(Clone)]
pub struct JobController {
    shared: Arc<Shared>,
}

impl JobController {
    pub fn new(tester: PrimalityTester, settings: JobSettings) -> Self {
        Self::with_metrics(tester, settings, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(
        tester: PrimalityTester,
        settings: JobSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        JobController {
            shared: Arc::new(Shared {
                jobs: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                active: AtomicUsize::new(0),
                tester,
                settings,
                metrics,
            }),
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.shared.metrics
    }

    pub fn settings(&self) -> JobSettings {
        self.shared.settings
    }

    pub fn active_jobs(&self) -> usize {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Validate and register a pending job. Invalid requests never get an id.
    pub fn create(&self, request: SearchRequest) -> Result<JobId, SearchError> {
        request.validate()?;
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let family = request.family();
        let (state, _) = watch::channel(JobSnapshot::pending(id, request));
        lock_or_recover(&self.shared.jobs).insert(
            id,
            JobSlot {
                state: Arc::new(state),
                cancel: Arc::new(AtomicBool::new(false)),
                started: None,
            },
        );
        debug!(job_id = id, family = %family, "job created");
        Ok(id)
    }

    /// Create and immediately start a job, returning its running snapshot.
    /// If it cannot start, it is removed.
    pub fn submit(&self, request: SearchRequest) -> Result<JobSnapshot, SearchError> {
        self.submit_watched(request).map(|(snapshot, _)| snapshot)
    }

    /// [`submit`](Self::submit), plus a receiver subscribed before the worker
    /// starts.
    pub fn submit_watched(
        &self,
        request: SearchRequest,
    ) -> Result<(JobSnapshot, watch::Receiver<JobSnapshot>), SearchError> {
        let id = self.create(request)?;
        let started = self
            .subscribe(id)
            .and_then(|rx| self.start(id).map(|snapshot| (snapshot, rx)));
        if started.is_err() {
            lock_or_recover(&self.shared.jobs).remove(&id);
        }
        started
    }

    pub fn start(&self, id: JobId) -> Result<JobSnapshot, SearchError> {
        let mut jobs = lock_or_recover(&self.shared.jobs);
        let slot = jobs.get_mut(&id).ok_or(SearchError::JobNotFound(id))?;
        let status = slot.state.borrow().status;
        match status {
            JobStatus::Pending => {}
            JobStatus::Running => return Err(SearchError::AlreadyRunning(id)),
            other => {
                return Err(SearchError::NotPending {
                    id,
                    status: other.to_string(),
                })
            }
        }

        let max = self.shared.settings.max_active_jobs;
        if self.shared.active.load(Ordering::Acquire) >= max {
            return Err(SearchError::Busy(max));
        }
        let running = self.shared.active.fetch_add(1, Ordering::AcqRel) + 1;

        let started = Instant::now();
        slot.started = Some(started);
        slot.state.send_modify(|s| {
            s.status = JobStatus::Running;
            s.sequence += 1;
            s.started_at = Some(Utc::now());
        });
        let snapshot = slot.state.borrow().clone();
        let state = Arc::clone(&slot.state);
        let cancel = Arc::clone(&slot.cancel);
        drop(jobs);

        let request = snapshot.request.clone();
        let family = request.family();
        self.shared.metrics.job_started(family.as_str());
        self.shared.metrics.set_active(running);
        info!(job_id = id, family = %family, params = %request.describe(), "job started");

        let shared = Arc::clone(&self.shared);
        let worker_state = Arc::clone(&state);
        let spawned = thread::Builder::new()
            .name(format!("search-job-{}", id))
            .spawn(move || run_job(shared, id, request, worker_state, cancel, started));
        if let Err(e) = spawned {
            let reason = format!("could not spawn worker thread: {}", e);
            self.shared.finish(
                id,
                &state,
                family,
                JobStatus::Failed,
                None,
                Some(reason.clone()),
                started,
            );
            return Err(SearchError::Internal(reason));
        }
        Ok(snapshot)
    }

    /// Ask a job to stop. A pending job is cancelled on the spot; a running
    /// job stops at its next candidate boundary; a finished job is unchanged.
    pub fn cancel(&self, id: JobId) -> Result<JobSnapshot, SearchError> {
        let jobs = lock_or_recover(&self.shared.jobs);
        let slot = jobs.get(&id).ok_or(SearchError::JobNotFound(id))?;
        let status = slot.state.borrow().status;
        let mut evict = false;
        match status {
            JobStatus::Pending => {
                slot.cancel.store(true, Ordering::Release);
                slot.state.send_modify(|s| {
                    s.status = JobStatus::Cancelled;
                    s.sequence += 1;
                    s.finished_at = Some(Utc::now());
                });
                self.shared
                    .metrics
                    .job_finished(slot.state.borrow().family.as_str(), "cancelled");
                info!(job_id = id, "pending job cancelled");
                evict = true;
            }
            JobStatus::Running => {
                slot.cancel.store(true, Ordering::Release);
                info!(job_id = id, "cancellation requested");
            }
            _ => {}
        }
        let snapshot = slot.state.borrow().clone();
        drop(jobs);
        if evict {
            self.shared.evict_finished();
        }
        Ok(snapshot)
    }

    /// Consistent copy of the job's state. Elapsed time of a running job is
    /// brought up to date.
    pub fn snapshot(&self, id: JobId) -> Result<JobSnapshot, SearchError> {
        let jobs = lock_or_recover(&self.shared.jobs);
        let slot = jobs.get(&id).ok_or(SearchError::JobNotFound(id))?;
        Ok(current_snapshot(slot))
    }

    /// Snapshots of every retained job, ascending by id.
    pub fn list(&self) -> Vec<JobSnapshot> {
        let jobs = lock_or_recover(&self.shared.jobs);
        let mut all: Vec<JobSnapshot> = jobs.values().map(current_snapshot).collect();
        all.sort_by_key(|s| s.id);
        all
    }

    /// Remove a finished job and hand back its final snapshot.
    pub fn acknowledge(&self, id: JobId) -> Result<JobSnapshot, SearchError> {
        let mut jobs = lock_or_recover(&self.shared.jobs);
        let slot = jobs.get(&id).ok_or(SearchError::JobNotFound(id))?;
        if !slot.state.borrow().status.is_terminal() {
            return Err(SearchError::NotFinished(id));
        }
        let snapshot = slot.state.borrow().clone();
        jobs.remove(&id);
        debug!(job_id = id, "job acknowledged");
        Ok(snapshot)
    }

    /// Receiver that yields the current snapshot and every later change.
    pub fn subscribe(&self, id: JobId) -> Result<watch::Receiver<JobSnapshot>, SearchError> {
        let jobs = lock_or_recover(&self.shared.jobs);
        let slot = jobs.get(&id).ok_or(SearchError::JobNotFound(id))?;
        Ok(slot.state.subscribe())
    }

    /// Wait until the job reaches a terminal status.
    pub async fn wait(&self, id: JobId) -> Result<JobSnapshot, SearchError> {
        wait_terminal(self.subscribe(id)?).await
    }
}

/// Wait on an existing receiver until its job reaches a terminal status.
pub async fn wait_terminal(
    mut rx: watch::Receiver<JobSnapshot>,
) -> Result<JobSnapshot, SearchError> {
    let id = rx.borrow().id;
    let terminal = rx
        .wait_for(|s| s.status.is_terminal())
        .await
        .map(|s| JobSnapshot::clone(&s));
    terminal.map_err(|_| SearchError::JobNotFound(id))
}

fn current_snapshot(slot: &JobSlot) -> JobSnapshot {
    let mut snapshot = slot.state.borrow().clone();
    if snapshot.status == JobStatus::Running {
        if let Some(started) = slot.started {
            snapshot.elapsed_seconds = started.elapsed().as_secs_f64();
        }
    }
    snapshot
}

impl Shared {
    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        id: JobId,
        state: &watch::Sender<JobSnapshot>,
        family: Family,
        status: JobStatus,
        result: Option<SearchResult>,
        reason: Option<String>,
        started: Instant,
    ) {
        let elapsed = started.elapsed().as_secs_f64();
        // Released before publishing: a waiter that sees the terminal status
        // must also see the freed capacity.
        let running = self.active.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        state.send_modify(|s| {
            s.status = status;
            s.sequence += 1;
            s.result = result;
            s.reason = reason.clone();
            s.elapsed_seconds = elapsed;
            s.finished_at = Some(Utc::now());
        });
        self.metrics.job_finished(family.as_str(), status.as_str());
        self.metrics.set_active(running);
        match (status, reason) {
            (JobStatus::Failed, Some(reason)) => {
                error!(job_id = id, family = %family, reason = %reason, "job failed")
            }
            _ => info!(
                job_id = id,
                family = %family,
                status = %status,
                elapsed = format_args!("{:.2}s", elapsed),
                "job finished"
            ),
        }
        self.evict_finished();
    }

    /// Drop the oldest terminal jobs beyond the retention limit.
    fn evict_finished(&self) {
        let mut jobs = lock_or_recover(&self.jobs);
        let mut finished: Vec<(DateTime<Utc>, JobId)> = jobs
            .iter()
            .filter_map(|(id, slot)| {
                let s = slot.state.borrow();
                let finished_at = s.finished_at.unwrap_or(s.created_at);
                if s.status.is_terminal() {
                    Some((finished_at, *id))
                } else {
                    None
                }
            })
            .collect();
        let retain = self.settings.retain_finished;
        if finished.len() <= retain {
            return;
        }
        finished.sort();
        let excess = finished.len() - retain;
        for (_, id) in finished.into_iter().take(excess) {
            jobs.remove(&id);
            debug!(job_id = id, "evicted finished job");
        }
    }
}

/// Monitor handed to a running search: reads the job's stop flag and
/// publishes one snapshot per tested candidate.
struct JobMonitor {
    id: JobId,
    family: Family,
    state: Arc<watch::Sender<JobSnapshot>>,
    cancel: Arc<AtomicBool>,
    started: Instant,
    metrics: Arc<Metrics>,
}

impl SearchMonitor for JobMonitor {
    fn is_stop_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn candidate_tested(&self, candidate: Candidate) {
        let elapsed = self.started.elapsed().as_secs_f64();
        self.state.send_modify(|s| {
            s.sequence += 1;
            s.tested += 1;
            s.current = Some(candidate);
            s.elapsed_seconds = elapsed;
        });
        self.metrics.candidate_tested(self.family.as_str());
    }

    fn prime_found(&self, description: &str) {
        info!(job_id = self.id, family = %self.family, prime = description, "prime found");
    }
}

fn run_job(
    shared: Arc<Shared>,
    id: JobId,
    request: SearchRequest,
    state: Arc<watch::Sender<JobSnapshot>>,
    cancel: Arc<AtomicBool>,
    started: Instant,
) {
    let family = request.family();
    let monitor = JobMonitor {
        id,
        family,
        state: Arc::clone(&state),
        cancel: Arc::clone(&cancel),
        started,
        metrics: Arc::clone(&shared.metrics),
    };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_search(&request, &shared.tester, &monitor)
    }));

    let (status, result, reason) = match outcome {
        Ok(Ok(_)) if cancel.load(Ordering::Acquire) => (JobStatus::Cancelled, None, None),
        Ok(Ok(Outcome::Found(r))) => (JobStatus::Found, Some(r), None),
        Ok(Ok(Outcome::Exhausted(r))) => (JobStatus::Exhausted, r, None),
        Ok(Ok(Outcome::Cancelled)) => (JobStatus::Cancelled, None, None),
        Ok(Err(e)) => (JobStatus::Failed, None, Some(e.to_string())),
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            warn!(job_id = id, panic = %msg, "search panicked");
            (JobStatus::Failed, None, Some(format!("search panicked: {}", msg)))
        }
    };
    shared.finish(id, &state, family, status, result, reason, started);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::GoldbachDecomposition;
    use std::time::Duration;

    fn controller(settings: JobSettings) -> JobController {
        JobController::new(PrimalityTester::default(), settings)
    }

    fn goldbach(n: &str) -> SearchRequest {
        SearchRequest::Goldbach {
            numbers: vec![n.to_string()],
        }
    }

    /// A search that runs far longer than any test waits for it.
    fn long_running() -> SearchRequest {
        SearchRequest::Palindromic {
            min_digits: 3001,
            max_digits: None,
        }
    }

    async fn wait_for_progress(ctl: &JobController, id: JobId) {
        let mut rx = ctl.subscribe(id).unwrap();
        tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| s.tested > 0))
            .await
            .expect("no progress within timeout")
            .unwrap();
    }

    #[tokio::test]
    async fn submitted_job_runs_to_found() {
        let ctl = controller(JobSettings::default());
        let id = ctl.submit(goldbach("100")).unwrap().id;
        let done = ctl.wait(id).await.unwrap();
        assert_eq!(done.status, JobStatus::Found);
        assert_eq!(
            done.result,
            Some(SearchResult::Goldbach {
                decompositions: vec![GoldbachDecomposition {
                    number: "100".into(),
                    pair: Some(["3".into(), "97".into()]),
                }],
            })
        );
        assert!(done.tested >= 2);
        assert!(done.finished_at.is_some());
        assert_eq!(ctl.active_jobs(), 0);
    }

    #[tokio::test]
    async fn invalid_request_creates_no_job() {
        let ctl = controller(JobSettings::default());
        let err = ctl.submit(goldbach("7")).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(ctl.list().is_empty());
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_running() {
        let ctl = controller(JobSettings::default());
        let id = ctl.create(long_running()).unwrap();
        assert_eq!(ctl.snapshot(id).unwrap().status, JobStatus::Pending);
        ctl.start(id).unwrap();
        assert_eq!(ctl.start(id).unwrap_err(), SearchError::AlreadyRunning(id));
        assert_eq!(ctl.acknowledge(id).unwrap_err(), SearchError::NotFinished(id));

        ctl.cancel(id).unwrap();
        let done = ctl.wait(id).await.unwrap();
        assert_eq!(done.status, JobStatus::Cancelled);
        assert!(done.result.is_none());
        assert!(matches!(
            ctl.start(id).unwrap_err(),
            SearchError::NotPending { .. }
        ));
    }

    #[tokio::test]
    async fn cancel_after_progress_ends_cancelled() {
        let ctl = controller(JobSettings::default());
        let id = ctl.submit(long_running()).unwrap().id;
        wait_for_progress(&ctl, id).await;
        let running = ctl.snapshot(id).unwrap();
        assert_eq!(running.status, JobStatus::Running);
        assert!(running.current.is_some());

        ctl.cancel(id).unwrap();
        let done = ctl.wait(id).await.unwrap();
        assert_eq!(done.status, JobStatus::Cancelled);
        assert!(done.sequence > running.sequence);
    }

    #[tokio::test]
    async fn cancelling_pending_job_is_immediate() {
        let ctl = controller(JobSettings::default());
        let id = ctl.create(goldbach("4")).unwrap();
        let snap = ctl.cancel(id).unwrap();
        assert_eq!(snap.status, JobStatus::Cancelled);
        assert_eq!(snap.tested, 0);
        assert!(matches!(
            ctl.start(id).unwrap_err(),
            SearchError::NotPending { .. }
        ));
    }

    #[tokio::test]
    async fn capacity_limit_reports_busy() {
        let ctl = controller(JobSettings {
            max_active_jobs: 1,
            retain_finished: 8,
        });
        let first = ctl.submit(long_running()).unwrap().id;
        assert_eq!(ctl.submit(goldbach("4")).unwrap_err(), SearchError::Busy(1));
        // The rejected submission leaves nothing behind.
        assert_eq!(ctl.list().len(), 1);

        ctl.cancel(first).unwrap();
        ctl.wait(first).await.unwrap();
        let second = ctl.submit(goldbach("4")).unwrap().id;
        assert_eq!(ctl.wait(second).await.unwrap().status, JobStatus::Found);
    }

    #[tokio::test]
    async fn acknowledge_removes_finished_job() {
        let ctl = controller(JobSettings::default());
        let id = ctl.submit(goldbach("4")).unwrap().id;
        ctl.wait(id).await.unwrap();
        let snap = ctl.acknowledge(id).unwrap();
        assert_eq!(snap.status, JobStatus::Found);
        assert_eq!(ctl.snapshot(id).unwrap_err(), SearchError::JobNotFound(id));
        assert_eq!(ctl.acknowledge(id).unwrap_err(), SearchError::JobNotFound(id));
    }

    #[tokio::test]
    async fn oldest_finished_jobs_are_evicted() {
        let ctl = controller(JobSettings {
            max_active_jobs: 4,
            retain_finished: 2,
        });
        let mut ids = Vec::new();
        for n in ["4", "6", "8"] {
            let id = ctl.submit(goldbach(n)).unwrap().id;
            ctl.wait(id).await.unwrap();
            ids.push(id);
        }
        // Eviction runs right after the terminal snapshot is published.
        for _ in 0..100 {
            if ctl.list().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let kept: Vec<JobId> = ctl.list().iter().map(|s| s.id).collect();
        assert_eq!(kept, ids[1..].to_vec());
    }

    #[tokio::test]
    async fn published_sequences_strictly_increase() {
        let ctl = controller(JobSettings::default());
        let id = ctl.create(goldbach("1000")).unwrap();
        let mut rx = ctl.subscribe(id).unwrap();
        ctl.start(id).unwrap();
        let mut last = rx.borrow_and_update().sequence;
        loop {
            if rx.changed().await.is_err() {
                break;
            }
            let snap = rx.borrow_and_update().clone();
            assert!(snap.sequence > last, "{} after {}", snap.sequence, last);
            last = snap.sequence;
            if snap.status.is_terminal() {
                break;
            }
        }
        assert!(ctl.snapshot(id).unwrap().status.is_terminal());
    }

    #[tokio::test]
    async fn composite_perfect_exponent_ends_failed() {
        let ctl = controller(JobSettings::default());
        let id = ctl
            .submit(SearchRequest::Perfect {
                exponents: vec![2, 11],
            })
            .unwrap()
            .id;
        let done = ctl.wait(id).await.unwrap();
        assert_eq!(done.status, JobStatus::Failed);
        assert_eq!(
            done.reason.as_deref(),
            Some("precondition failed: 2^11 - 1 is not prime")
        );
        assert!(done.result.is_none());
        assert_eq!(ctl.active_jobs(), 0);
    }

    #[tokio::test]
    async fn submitted_snapshot_survives_immediate_eviction() {
        let ctl = controller(JobSettings {
            max_active_jobs: 4,
            retain_finished: 0,
        });
        for _ in 0..50 {
            let (started, rx) = ctl.submit_watched(goldbach("4")).unwrap();
            assert_eq!(started.status, JobStatus::Running);
            let done = wait_terminal(rx).await.unwrap();
            assert_eq!(done.id, started.id);
            assert_eq!(done.status, JobStatus::Found);
        }
        // Nothing finished is retained.
        for _ in 0..100 {
            if ctl.list().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(ctl.list().is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let ctl = controller(JobSettings::default());
        assert_eq!(ctl.snapshot(42).unwrap_err(), SearchError::JobNotFound(42));
        assert_eq!(ctl.start(42).unwrap_err(), SearchError::JobNotFound(42));
        assert_eq!(ctl.cancel(42).unwrap_err(), SearchError::JobNotFound(42));
        assert!(ctl.subscribe(42).is_err());
        assert_eq!(ctl.wait(42).await.unwrap_err(), SearchError::JobNotFound(42));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let caught = panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "boom 7");
        let caught = panic::catch_unwind(|| std::panic::panic_any(5u8)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "unknown panic payload");
    }

    #[test]
    fn status_terminality() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        for s in [
            JobStatus::Found,
            JobStatus::Exhausted,
            JobStatus::Cancelled,
            JobStatus::Failed,
        ] {
            assert!(s.is_terminal());
            assert_eq!(serde_json::to_value(s).unwrap(), s.as_str());
        }
    }
}
