//! # Prometheus Metrics — Job and Candidate Counters
//!
//! Exposes search-service metrics in the Prometheus text exposition format.
//!
//! ## Metrics Exposed
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `primequest_jobs_started_total` | Counter | `family` | Jobs moved from pending to running |
//! | `primequest_jobs_finished_total` | Counter | `family`, `status` | Jobs that reached a terminal status |
//! | `primequest_candidates_tested_total` | Counter | `family` | Candidates tested by running jobs |
//! | `primequest_jobs_active` | Gauge | — | Jobs currently running |
//!
//! The job controller updates the registry; `/metrics` renders it on each
//! scrape.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct FamilyLabel {
    pub family: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct FinishLabel {
    pub family: String,
    pub status: String,
}

pub struct Metrics {
    pub registry: Registry,
    pub jobs_started: Family<FamilyLabel, Counter>,
    pub jobs_finished: Family<FinishLabel, Counter>,
    pub candidates_tested: Family<FamilyLabel, Counter>,
    pub jobs_active: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let jobs_started = Family::<FamilyLabel, Counter>::default();
        registry.register(
            "primequest_jobs_started",
            "Search jobs started by family",
            jobs_started.clone(),
        );

        let jobs_finished = Family::<FinishLabel, Counter>::default();
        registry.register(
            "primequest_jobs_finished",
            "Search jobs finished by family and terminal status",
            jobs_finished.clone(),
        );

        let candidates_tested = Family::<FamilyLabel, Counter>::default();
        registry.register(
            "primequest_candidates_tested",
            "Candidates tested by family",
            candidates_tested.clone(),
        );

        let jobs_active = Gauge::default();
        registry.register(
            "primequest_jobs_active",
            "Number of running search jobs",
            jobs_active.clone(),
        );

        Self {
            registry,
            jobs_started,
            jobs_finished,
            candidates_tested,
            jobs_active,
        }
    }

    pub fn job_started(&self, family: &str) {
        self.jobs_started
            .get_or_create(&FamilyLabel {
                family: family.to_string(),
            })
            .inc();
    }

    pub fn job_finished(&self, family: &str, status: &str) {
        self.jobs_finished
            .get_or_create(&FinishLabel {
                family: family.to_string(),
                status: status.to_string(),
            })
            .inc();
    }

    pub fn set_active(&self, running: usize) {
        self.jobs_active.set(running as i64);
    }

    pub fn candidate_tested(&self, family: &str) {
        self.candidates_tested
            .get_or_create(&FamilyLabel {
                family: family.to_string(),
            })
            .inc();
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        if let Err(e) = encode(&mut buf, &self.registry) {
            tracing::warn!(error = %e, "metrics encoding failed");
        }
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
