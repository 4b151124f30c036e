//! # Events — Progress and Terminal Events of a Job
//!
//! A job publishes snapshots; this module turns them into the two kinds of
//! event a caller consumes:
//!
//! | Event | Emitted When |
//! |-------|-------------|
//! | `Progress` | A running job finished testing a candidate |
//! | `Terminal` | The job reached found, exhausted, cancelled or failed |
//!
//! Both carry the snapshot's sequence number. A consumer feeds events through
//! an [`EventSequencer`], which drops anything stale or duplicated (watch
//! channels coalesce and may repeat a value) and anything after the terminal
//! event.
//!
//! ## Wire Shapes
//!
//! `to_json` renders the full event, tagged by `"type"`. `to_compact_json`
//! renders the flat payload of the single-family endpoints:
//!
//! ```text
//! {"current_index": 1042, "elapsed_seconds": 3.17}
//! {"status": "found", "found": true, "family": "kaprekar", "n": 1042, ..., "elapsed_seconds": 3.2}
//! ```
//!
//! Elapsed seconds are rounded to two decimals on the wire.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::jobs::{JobId, JobSnapshot, JobStatus};
use crate::outcome::{Candidate, SearchResult};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    pub sequence: u64,
    pub elapsed_seconds: f64,
    pub candidate: Candidate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TerminalEvent {
    pub job_id: JobId,
    pub sequence: u64,
    pub status: JobStatus,
    pub elapsed_seconds: f64,
    pub tested: u64,
    pub result: Option<SearchResult>,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Progress(ProgressEvent),
    Terminal(TerminalEvent),
}

pub fn round_seconds(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

impl JobEvent {
    /// The event a snapshot represents, if any. Pending jobs and running jobs
    /// that have not tested a candidate yet have nothing to report.
    pub fn from_snapshot(s: &JobSnapshot) -> Option<JobEvent> {
        if s.status.is_terminal() {
            return Some(JobEvent::Terminal(TerminalEvent {
                job_id: s.id,
                sequence: s.sequence,
                status: s.status,
                elapsed_seconds: s.elapsed_seconds,
                tested: s.tested,
                result: s.result.clone(),
                reason: s.reason.clone(),
            }));
        }
        match (&s.status, &s.current) {
            (JobStatus::Running, Some(candidate)) => Some(JobEvent::Progress(ProgressEvent {
                job_id: s.id,
                sequence: s.sequence,
                elapsed_seconds: s.elapsed_seconds,
                candidate: candidate.clone(),
            })),
            _ => None,
        }
    }

    pub fn sequence(&self) -> u64 {
        match self {
            JobEvent::Progress(p) => p.sequence,
            JobEvent::Terminal(t) => t.sequence,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Terminal(_))
    }

    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::Progress(_) => "progress",
            JobEvent::Terminal(_) => "terminal",
        }
    }

    pub fn to_json(&self) -> Value {
        let mut v = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(secs) = v.get_mut("elapsed_seconds") {
            *secs = json!(round_seconds(self.elapsed_seconds()));
        }
        v
    }

    pub fn to_compact_json(&self) -> Value {
        match self {
            JobEvent::Progress(p) => json!({
                "current_index": index_value(&p.candidate),
                "elapsed_seconds": round_seconds(p.elapsed_seconds),
            }),
            JobEvent::Terminal(t) => terminal_payload(t),
        }
    }

    fn elapsed_seconds(&self) -> f64 {
        match self {
            JobEvent::Progress(p) => p.elapsed_seconds,
            JobEvent::Terminal(t) => t.elapsed_seconds,
        }
    }
}

/// Small indices go out as JSON integers, large ones as exact strings.
fn index_value(candidate: &Candidate) -> Value {
    match candidate.small_index() {
        Some(i) => json!(i),
        None => json!(candidate.index),
    }
}

/// Flat terminal payload: status fields, then the result's own fields.
pub fn terminal_payload(t: &TerminalEvent) -> Value {
    let mut obj = Map::new();
    obj.insert("status".into(), json!(t.status));
    obj.insert("found".into(), json!(t.status == JobStatus::Found));
    if let Some(result) = &t.result {
        if let Ok(Value::Object(fields)) = serde_json::to_value(result) {
            obj.extend(fields);
        }
    }
    if let Some(reason) = &t.reason {
        obj.insert("error".into(), json!(reason));
    }
    obj.insert(
        "elapsed_seconds".into(),
        json!(round_seconds(t.elapsed_seconds)),
    );
    Value::Object(obj)
}

/// Ordered consumer state: accepts events with increasing sequence numbers
/// up to and including the terminal one.
#[derive(Debug, Default)]
pub struct EventSequencer {
    last: Option<u64>,
    finished: bool,
}

impl EventSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if the event should be delivered.
    pub fn accept(&mut self, event: &JobEvent) -> bool {
        if self.finished {
            return false;
        }
        if let Some(last) = self.last {
            if event.sequence() <= last {
                return false;
            }
        }
        self.last = Some(event.sequence());
        self.finished = event.is_terminal();
        true
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
