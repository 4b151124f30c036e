//! # Kaprekar — Ascending-Descending Concatenation Primes
//!
//! The candidate for `n` is the decimal concatenation `1 2 … n … 2 1`: the
//! integers `1..=n` followed by `n−1` down to `1`, read as one number. For
//! `n = 10` that is `12345678910987654321`, which is prime; the next `n`
//! giving a prime is 2446 (OEIS A173426).
//!
//! Each `n` is one quantum: build the candidate from its decimal text, test
//! it, report progress. The search stops at the first probable prime.

use rug::Integer;

use crate::bignum;
use crate::error::SearchError;
use crate::outcome::{Candidate, Outcome, SearchResult};
use crate::primality::PrimalityTester;
use crate::search_params::abbreviate;
use crate::SearchMonitor;

pub fn kaprekar_number(n: u64) -> Result<Integer, SearchError> {
    bignum::concat_decimal((1..=n).chain((1..n).rev()))
}

pub fn search(
    start: u64,
    end: u64,
    tester: &PrimalityTester,
    monitor: &dyn SearchMonitor,
) -> Result<Outcome, SearchError> {
    for n in start..=end {
        if monitor.is_stop_requested() {
            return Ok(Outcome::Cancelled);
        }
        let candidate = kaprekar_number(n)?;
        let digits = bignum::digit_count(&candidate);
        let prime = tester.is_probable_prime(&candidate);
        monitor.candidate_tested(Candidate::new(n, digits));
        if prime {
            let value = bignum::to_decimal(&candidate);
            monitor.prime_found(&format!("kaprekar({}) = {}", n, abbreviate(&value)));
            return Ok(Outcome::Found(SearchResult::Kaprekar { n, value, digits }));
        }
    }
    Ok(Outcome::Exhausted(None))
}
