//! # CLI Execution Functions
//!
//! Execution logic for the family subcommands and rayon configuration, kept
//! out of `main.rs` so the entry point stays a thin argument router.

use anyhow::{Context, Result};
use primequest::config::ServiceConfig;
use primequest::jobs::JobStatus;
use primequest::outcome::Outcome;
use primequest::progress::Progress;
use primequest::search_params::SearchRequest;
use serde_json::{json, Map, Value};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{info, info_span, warn};

// ── Foreground Search ───────────────────────────────────────────

/// Run one search on this thread with a progress reporter alongside, then
/// print the outcome as a JSON object on stdout.
pub fn run_family(
    config: &ServiceConfig,
    request: &SearchRequest,
    max_seconds: Option<u64>,
) -> Result<()> {
    let family = request.family();
    let _span = info_span!("search", family = %family).entered();
    info!(
        cores = rayon::current_num_threads(),
        rounds = config.primality.rounds,
        params = %request.describe(),
        "search starting"
    );

    let tester = config.tester();
    let progress = match max_seconds {
        Some(secs) => Progress::with_deadline(Duration::from_secs(secs)),
        None => Progress::new(),
    };
    let reporter = progress
        .start_reporter(Duration::from_secs(config.jobs.report_interval_secs))
        .context("starting progress reporter")?;

    let outcome = primequest::run_search(request, &tester, progress.as_ref());

    progress.stop();
    if reporter.join().is_err() {
        warn!("progress reporter panicked");
    }
    let outcome = outcome.with_context(|| format!("{} search failed", family))?;

    let status = match &outcome {
        Outcome::Found(_) => JobStatus::Found,
        Outcome::Exhausted(_) => JobStatus::Exhausted,
        Outcome::Cancelled => {
            warn!("time limit reached, search stopped");
            JobStatus::Cancelled
        }
    };
    let tested = progress.tested.load(Ordering::Relaxed);
    let elapsed = progress.elapsed().as_secs_f64();
    info!(status = %status, tested, elapsed_secs = format_args!("{:.2}", elapsed), "search finished");

    let report = outcome_report(status, outcome, tested, elapsed);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("rendering result")?
    );
    Ok(())
}

/// `{status, found, tested, elapsed_seconds}` followed by the result fields.
fn outcome_report(status: JobStatus, outcome: Outcome, tested: u64, elapsed: f64) -> Value {
    let mut obj = Map::new();
    obj.insert("status".into(), json!(status));
    obj.insert("found".into(), json!(status == JobStatus::Found));
    obj.insert("tested".into(), json!(tested));
    obj.insert(
        "elapsed_seconds".into(),
        json!(primequest::events::round_seconds(elapsed)),
    );
    if let Some(result) = outcome.into_result() {
        if let Ok(Value::Object(fields)) = serde_json::to_value(result) {
            obj.extend(fields);
        }
    }
    Value::Object(obj)
}

// ── Rayon Configuration ─────────────────────────────────────────

/// Size the rayon global thread pool; `None` or 0 keeps one thread per core.
pub fn configure_rayon(threads: Option<usize>) {
    let num_threads = threads.unwrap_or(0);
    if num_threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            warn!(error = %e, "Could not configure rayon thread pool");
        }
    }
}
