//! # Progress — Counters and Stop Flag for Command-Line Searches
//!
//! Thread-safe progress shared between a search (possibly fanned out over
//! rayon workers) and a background status reporter. Counters are atomics; the
//! current candidate sits behind a `Mutex` and is only read by the reporter.
//!
//! `Progress` is the [`SearchMonitor`] used when a search runs directly from
//! the command line. Jobs run by the controller use their own monitor that
//! publishes snapshots instead (see `jobs`).
//!
//! ## Background Reporter
//!
//! `start_reporter` spawns a thread that logs a status line every
//! `interval`: tested count, primes found, rate, current candidate. `stop`
//! ends it on the next wake-up.
//!
//! ## Time Limit
//!
//! `with_deadline` makes `is_stop_requested` turn true once the limit has
//! passed, which ends the search as Cancelled at the next candidate boundary.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

use crate::jobs::lock_or_recover;
use crate::outcome::Candidate;
use crate::SearchMonitor;

pub struct Progress {
    pub tested: AtomicU64,
    pub found: AtomicU64,
    pub current: Mutex<Option<Candidate>>,
    start: Instant,
    deadline: Option<Instant>,
    stop_requested: AtomicBool,
    shutdown: AtomicBool,
}

impl Progress {
    pub fn new() -> Arc<Self> {
        Self::build(None)
    }

    /// Progress whose stop flag trips after `limit`.
    pub fn with_deadline(limit: Duration) -> Arc<Self> {
        Self::build(Some(Instant::now() + limit))
    }

    fn build(deadline: Option<Instant>) -> Arc<Self> {
        Arc::new(Progress {
            tested: AtomicU64::new(0),
            found: AtomicU64::new(0),
            current: Mutex::new(None),
            start: Instant::now(),
            deadline,
            stop_requested: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn start_reporter(
        self: &Arc<Self>,
        interval: Duration,
    ) -> std::io::Result<thread::JoinHandle<()>> {
        let progress = Arc::clone(self);
        thread::Builder::new()
            .name("progress-reporter".into())
            .spawn(move || {
                // Sleep in short steps so `stop` is noticed promptly.
                let step = interval.min(Duration::from_millis(250));
                let mut since_report = Duration::ZERO;
                loop {
                    thread::sleep(step);
                    if progress.shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    since_report += step;
                    if since_report >= interval {
                        since_report = Duration::ZERO;
                        progress.print_status();
                    }
                }
            })
    }

    pub fn print_status(&self) {
        let elapsed = self.start.elapsed();
        let tested = self.tested.load(Ordering::Relaxed);
        let found = self.found.load(Ordering::Relaxed);
        let current = lock_or_recover(&self.current)
            .as_ref()
            .map(|c| format!("{} ({} digits)", c.index, c.digits))
            .unwrap_or_default();
        let rate = if elapsed.as_secs_f64() > 0.0 {
            tested as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let h = elapsed.as_secs() / 3600;
        let m = (elapsed.as_secs() % 3600) / 60;
        let s = elapsed.as_secs() % 60;
        info!(
            current = %current,
            tested,
            rate = format_args!("{:.2}", rate),
            found,
            elapsed = format_args!("{:02}:{:02}:{:02}", h, m, s),
            "search progress"
        );
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl SearchMonitor for Progress {
    fn is_stop_requested(&self) -> bool {
        if self.stop_requested.load(Ordering::Acquire) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.stop_requested.store(true, Ordering::Release);
                true
            }
            _ => false,
        }
    }

    fn candidate_tested(&self, candidate: Candidate) {
        self.tested.fetch_add(1, Ordering::Relaxed);
        *lock_or_recover(&self.current) = Some(candidate);
    }

    fn prime_found(&self, description: &str) {
        self.found.fetch_add(1, Ordering::Relaxed);
        info!(prime = description, "prime found");
    }
}
