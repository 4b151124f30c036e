//! # Between Squares — Prime Walk Above lower²
//!
//! Collects the first `count` probable primes strictly between `lower²` and
//! `upper²`. Even candidates are never built: after the special case of 2
//! (only reachable when `lower <= 1`) the walk steps over odd integers. Each
//! odd candidate is one quantum, and the candidate index is its offset above
//! `lower²`.
//!
//! Running out of room below `upper²` is an ordinary outcome: the job ends
//! Exhausted with the primes found so far.

use rug::Integer;

use crate::bignum;
use crate::error::SearchError;
use crate::outcome::{Candidate, Outcome, SearchResult};
use crate::primality::PrimalityTester;
use crate::search_params::abbreviate;
use crate::SearchMonitor;

/// Exact digit count of a value that only ever increases.
struct DigitTracker {
    digits: u64,
    next_power: Integer,
}

impl DigitTracker {
    fn new(start: &Integer) -> Self {
        let digits = bignum::digit_count(start);
        DigitTracker {
            digits,
            next_power: bignum::pow(&Integer::from(10u32), digits as u32),
        }
    }

    fn digits_of(&mut self, n: &Integer) -> u64 {
        while *n >= self.next_power {
            self.digits += 1;
            self.next_power *= 10u32;
        }
        self.digits
    }
}

pub fn search(
    lower: &Integer,
    upper: &Integer,
    count: usize,
    tester: &PrimalityTester,
    monitor: &dyn SearchMonitor,
) -> Result<Outcome, SearchError> {
    if *lower < 0 || lower >= upper {
        return Err(SearchError::invalid("bases must satisfy 0 <= lower < upper"));
    }
    let lo = Integer::from(lower.square_ref());
    let hi = Integer::from(upper.square_ref());
    let mut primes: Vec<String> = Vec::with_capacity(count.min(1024));

    let mut candidate = Integer::from(&lo + 1u32);
    if candidate <= 2 {
        if hi > 2 {
            if monitor.is_stop_requested() {
                return Ok(Outcome::Cancelled);
            }
            let two = Integer::from(2u32);
            monitor.candidate_tested(Candidate::from_integer(&Integer::from(&two - &lo), 1));
            monitor.prime_found("2");
            primes.push("2".to_string());
            if primes.len() >= count {
                return Ok(Outcome::Found(SearchResult::BetweenSquares { primes }));
            }
        }
        candidate = Integer::from(3u32);
    } else if candidate.is_even() {
        candidate += 1u32;
    }

    let mut digits = DigitTracker::new(&candidate);
    while candidate < hi {
        if monitor.is_stop_requested() {
            return Ok(Outcome::Cancelled);
        }
        let prime = tester.is_probable_prime(&candidate);
        let offset = Integer::from(&candidate - &lo);
        monitor.candidate_tested(Candidate::from_integer(&offset, digits.digits_of(&candidate)));
        if prime {
            let value = bignum::to_decimal(&candidate);
            monitor.prime_found(&format!("lower^2 + {} = {}", offset, abbreviate(&value)));
            primes.push(value);
            if primes.len() >= count {
                return Ok(Outcome::Found(SearchResult::BetweenSquares { primes }));
            }
        }
        candidate += 2u32;
    }
    Ok(Outcome::Exhausted(Some(SearchResult::BetweenSquares {
        primes,
    })))
}
