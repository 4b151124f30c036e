//! # Config — Service Configuration from TOML, Environment and Flags
//!
//! Layering, lowest precedence first:
//!
//! 1. Built-in defaults.
//! 2. An optional TOML file (`--config` / `PRIMEQUEST_CONFIG`).
//! 3. `PRIMEQUEST_*` environment variables and command-line flags, merged by
//!    clap and applied as [`ConfigOverrides`].
//!
//! ```toml
//! [primality]
//! rounds = 25
//!
//! [jobs]
//! max_active_jobs = 4
//! retain_finished = 64
//! report_interval_secs = 30
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 7070
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::jobs::JobSettings;
use crate::primality::{PrimalityTester, DEFAULT_ROUNDS};

// ── TOML Configuration Structs ──────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default)]
    pub primality: PrimalityConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// The `[primality]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimalityConfig {
    /// Witness rounds; a composite passes with probability at most 4^-rounds.
    #[serde(default = "default_rounds")]
    pub rounds: u32,
}

/// The `[jobs]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    #[serde(default = "default_max_active_jobs")]
    pub max_active_jobs: usize,
    /// Finished jobs kept for polling. `0` keeps none: results then reach
    /// only the creating request and live event streams.
    #[serde(default = "default_retain_finished")]
    pub retain_finished: usize,
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

/// The `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_rounds() -> u32 {
    DEFAULT_ROUNDS
}

fn default_max_active_jobs() -> usize {
    4
}

fn default_retain_finished() -> usize {
    64
}

fn default_report_interval() -> u64 {
    30
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7070
}

impl Default for PrimalityConfig {
    fn default() -> Self {
        PrimalityConfig {
            rounds: default_rounds(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        JobsConfig {
            max_active_jobs: default_max_active_jobs(),
            retain_finished: default_retain_finished(),
            report_interval_secs: default_report_interval(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Values from flags or environment that win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub rounds: Option<u32>,
    pub max_active_jobs: Option<usize>,
    pub retain_finished: Option<usize>,
    pub report_interval_secs: Option<u64>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

// ── Loading ─────────────────────────────────────────────────────

impl ServiceConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: ServiceConfig = toml::from_str(content).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when `path` is `None`, otherwise the parsed file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(ServiceConfig::default()),
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                Self::parse_toml(&content)
                    .with_context(|| format!("loading config file {}", path.display()))
            }
        }
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(rounds) = overrides.rounds {
            self.primality.rounds = rounds;
        }
        if let Some(n) = overrides.max_active_jobs {
            self.jobs.max_active_jobs = n;
        }
        if let Some(n) = overrides.retain_finished {
            self.jobs.retain_finished = n;
        }
        if let Some(secs) = overrides.report_interval_secs {
            self.jobs.report_interval_secs = secs;
        }
        if let Some(bind) = &overrides.bind {
            self.server.bind = bind.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.primality.rounds == 0 {
            bail!("primality.rounds must be at least 1");
        }
        if self.jobs.max_active_jobs == 0 {
            bail!("jobs.max_active_jobs must be at least 1");
        }
        if self.jobs.report_interval_secs == 0 {
            bail!("jobs.report_interval_secs must be at least 1");
        }
        if self.server.bind.trim().is_empty() {
            bail!("server.bind must not be empty");
        }
        Ok(())
    }

    pub fn tester(&self) -> PrimalityTester {
        PrimalityTester::new(self.primality.rounds)
    }

    pub fn job_settings(&self) -> JobSettings {
        JobSettings {
            max_active_jobs: self.jobs.max_active_jobs,
            retain_finished: self.jobs.retain_finished,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}
