pub mod between_squares;
pub mod bignum;
pub mod config;
pub mod error;
pub mod events;
pub mod goldbach;
pub mod jobs;
pub mod kaprekar;
pub mod mersenne;
pub mod outcome;
pub mod palindromic;
pub mod perfect;
pub mod primality;
pub mod progress;
pub mod prom_metrics;
pub mod repunit;
pub mod search_params;
pub mod server;
pub mod sieve;

use rayon::prelude::*;

use error::SearchError;
use outcome::{Candidate, Outcome};
use primality::PrimalityTester;
use search_params::SearchRequest;

/// Observer of a running search (command-line `Progress` or a controller job).
/// Search functions check `is_stop_requested` before each candidate and
/// report each candidate once it has been tested.
pub trait SearchMonitor: Send + Sync {
    fn is_stop_requested(&self) -> bool;
    fn candidate_tested(&self, candidate: Candidate);
    fn prime_found(&self, _description: &str) {}
}

/// Monitor that never stops and records nothing.
pub struct Unmonitored;

impl SearchMonitor for Unmonitored {
    fn is_stop_requested(&self) -> bool {
        false
    }

    fn candidate_tested(&self, _candidate: Candidate) {}
}

/// Validate `request` and run its family's search on the calling thread.
pub fn run_search(
    request: &SearchRequest,
    tester: &PrimalityTester,
    monitor: &dyn SearchMonitor,
) -> Result<Outcome, SearchError> {
    request.validate()?;
    match request {
        SearchRequest::Kaprekar { start, end } => kaprekar::search(*start, *end, tester, monitor),
        SearchRequest::Repunit { bound } => repunit::search(*bound, tester, monitor),
        SearchRequest::Mersenne { min_exp, max_exp } => {
            mersenne::search(*min_exp, *max_exp, tester, monitor)
        }
        SearchRequest::BetweenSquares {
            lower,
            upper,
            count,
        } => {
            let lower = bignum::parse_decimal(lower)?;
            let upper = bignum::parse_decimal(upper)?;
            between_squares::search(&lower, &upper, *count, tester, monitor)
        }
        SearchRequest::Palindromic {
            min_digits,
            max_digits,
        } => palindromic::search(*min_digits, *max_digits, tester, monitor),
        SearchRequest::Perfect { exponents } => perfect::search(exponents, tester, monitor),
        SearchRequest::Goldbach { numbers } => {
            let targets = numbers
                .iter()
                .map(|n| bignum::parse_decimal(n))
                .collect::<Result<Vec<_>, _>>()?;
            goldbach::search(&targets, tester, monitor)
        }
    }
}

/// Items handed to the rayon pool at once by [`collect_hits_parallel`].
pub(crate) const CHUNK: usize = 16;

enum Tested<H> {
    Skipped,
    Composite,
    Hit(H),
}

/// Run `test` over `items` in parallel chunks and gather its hits in input
/// order. `test` returns `None` for a miss. Every item checks the stop flag
/// before it runs; `None` overall means the search was stopped, and hits
/// from a partly finished chunk are dropped.
pub(crate) fn collect_hits_parallel<T, H, F>(
    items: &[T],
    monitor: &dyn SearchMonitor,
    test: F,
) -> Option<Vec<H>>
where
    T: Sync,
    H: Send,
    F: Fn(&T) -> Option<H> + Sync,
{
    let mut hits = Vec::new();
    for chunk in items.chunks(CHUNK) {
        if monitor.is_stop_requested() {
            return None;
        }
        let tested: Vec<Tested<H>> = chunk
            .par_iter()
            .map(|item| {
                if monitor.is_stop_requested() {
                    return Tested::Skipped;
                }
                match test(item) {
                    Some(hit) => Tested::Hit(hit),
                    None => Tested::Composite,
                }
            })
            .collect();
        if monitor.is_stop_requested() || tested.iter().any(|t| matches!(t, Tested::Skipped)) {
            return None;
        }
        hits.extend(tested.into_iter().filter_map(|t| match t {
            Tested::Hit(hit) => Some(hit),
            _ => None,
        }));
    }
    Some(hits)
}
