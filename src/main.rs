//! # Main — CLI Entry Point
//!
//! Routes subcommands to the search families and to the HTTP service.
//!
//! ## Subcommands
//!
//! One per family (`kaprekar`, `repunit`, `mersenne`, `between-squares`,
//! `palindromic`, `perfect`, `goldbach`), each running a single search in the
//! foreground and printing its result as JSON on stdout. Omitted parameters
//! take the family defaults. `serve` starts the HTTP service.
//!
//! ## Global Options
//!
//! - `--config` / `PRIMEQUEST_CONFIG`: TOML configuration file.
//! - `--rounds` / `PRIMEQUEST_ROUNDS`: witness rounds for probable-prime tests.
//! - `--max-active-jobs`, `--retain-finished`, `--report-interval`: job limits
//!   and reporter period (`PRIMEQUEST_*` equivalents).
//! - `--threads`: rayon thread pool size (defaults to all cores).
//! - `--max-seconds`: time limit for a foreground search.

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use primequest::config::{ConfigOverrides, ServiceConfig};
use primequest::search_params::{Family, SearchRequest};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "primequest",
    version,
    about = "Search for special primes and prime-derived numbers"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "PRIMEQUEST_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Witness rounds for probable-prime tests (error bound 4^-rounds)
    #[arg(long, env = "PRIMEQUEST_ROUNDS", global = true)]
    rounds: Option<u32>,

    /// Maximum number of jobs running at once
    #[arg(long, env = "PRIMEQUEST_MAX_ACTIVE_JOBS", global = true)]
    max_active_jobs: Option<usize>,

    /// Finished jobs kept for polling before the oldest are evicted
    #[arg(long, env = "PRIMEQUEST_RETAIN_FINISHED", global = true)]
    retain_finished: Option<usize>,

    /// Seconds between progress log lines of a foreground search
    #[arg(long, env = "PRIMEQUEST_REPORT_INTERVAL", global = true)]
    report_interval: Option<u64>,

    /// Number of rayon worker threads (defaults to all logical cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Stop a foreground search after this many seconds
    #[arg(long, global = true)]
    max_seconds: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// First probable prime among 123…n…321 for n in a range
    Kaprekar {
        #[arg(long)]
        start: Option<u64>,
        #[arg(long)]
        end: Option<u64>,
    },
    /// Every prime repunit R(N) = (10^N - 1)/9 with N up to a bound
    Repunit {
        #[arg(long)]
        bound: Option<u64>,
    },
    /// Every Mersenne prime 2^p - 1 with p in a range
    Mersenne {
        #[arg(long)]
        min_exp: Option<u64>,
        #[arg(long)]
        max_exp: Option<u64>,
    },
    /// The first primes above lower^2 and below upper^2
    BetweenSquares {
        /// Lower base (decimal)
        #[arg(long)]
        lower: Option<String>,
        /// Upper base (decimal)
        #[arg(long)]
        upper: Option<String>,
        #[arg(long)]
        count: Option<usize>,
    },
    /// Smallest palindromic prime with at least min-digits digits
    Palindromic {
        #[arg(long)]
        min_digits: Option<u64>,
        /// Give up once candidates would exceed this many digits
        #[arg(long)]
        max_digits: Option<u64>,
    },
    /// Even perfect numbers 2^(p-1)(2^p - 1) for Mersenne-prime exponents
    Perfect {
        #[arg(long, value_delimiter = ',')]
        exponents: Option<Vec<u64>>,
    },
    /// First Goldbach pair for each even target
    Goldbach {
        /// Even targets greater than 2 (decimal, comma separated)
        #[arg(long, value_delimiter = ',')]
        numbers: Option<Vec<String>>,
    },
    /// Start the HTTP service
    Serve {
        #[arg(long, env = "PRIMEQUEST_BIND")]
        bind: Option<String>,
        #[arg(long, env = "PRIMEQUEST_PORT")]
        port: Option<u16>,
    },
}

impl Commands {
    /// The search request for a family subcommand; `None` for `serve`.
    /// Flags left out fall back to the family defaults.
    fn request(&self) -> Result<Option<SearchRequest>> {
        let mut fields = match self {
            Commands::Kaprekar { start, end } => json!({
                "family": Family::Kaprekar, "start": start, "end": end,
            }),
            Commands::Repunit { bound } => json!({ "family": Family::Repunit, "bound": bound }),
            Commands::Mersenne { min_exp, max_exp } => json!({
                "family": Family::Mersenne, "min_exp": min_exp, "max_exp": max_exp,
            }),
            Commands::BetweenSquares {
                lower,
                upper,
                count,
            } => json!({
                "family": Family::BetweenSquares,
                "lower": lower,
                "upper": upper,
                "count": count,
            }),
            Commands::Palindromic {
                min_digits,
                max_digits,
            } => json!({
                "family": Family::Palindromic,
                "min_digits": min_digits,
                "max_digits": max_digits,
            }),
            Commands::Perfect { exponents } => json!({
                "family": Family::Perfect, "exponents": exponents,
            }),
            Commands::Goldbach { numbers } => json!({
                "family": Family::Goldbach, "numbers": numbers,
            }),
            Commands::Serve { .. } => return Ok(None),
        };
        if let Value::Object(map) = &mut fields {
            map.retain(|_, v| !v.is_null());
        }
        let request = serde_json::from_value(fields)
            .context("building search request")?;
        Ok(Some(request))
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // LOG_FORMAT=json for log shippers, human-readable otherwise
    if std::env::var("LOG_FORMAT").unwrap_or_default() == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_deref())?;
    let (bind, port) = match &cli.command {
        Commands::Serve { bind, port } => (bind.clone(), *port),
        _ => (None, None),
    };
    config.apply(&ConfigOverrides {
        rounds: cli.rounds,
        max_active_jobs: cli.max_active_jobs,
        retain_finished: cli.retain_finished,
        report_interval_secs: cli.report_interval,
        bind,
        port,
    })?;

    cli::configure_rayon(cli.threads);

    match cli.command.request()? {
        Some(request) => cli::run_family(&config, &request, cli.max_seconds),
        None => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(primequest::server::run(config))
        }
    }
}
