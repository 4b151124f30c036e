//! # Goldbach — First Prime Pair Summing to an Even Target
//!
//! For an even `N > 2`, walk `p` through the primes from 2 while `p <= N/2`
//! and stop at the first `p` for which `N − p` is also a probable prime. The
//! pair with the smallest `p` is returned, so `100 = 3 + 97`.
//!
//! Targets are decomposed in request order. A target with no pair (none is
//! known to exist) gets `pair: null` and the job ends Exhausted rather than
//! failing.

use rug::Integer;

use crate::bignum;
use crate::error::SearchError;
use crate::outcome::{Candidate, GoldbachDecomposition, Outcome, SearchResult};
use crate::primality::PrimalityTester;
use crate::SearchMonitor;

enum Decomposed {
    Pair(Integer, Integer),
    NoPair,
    Stopped,
}

fn decompose(
    n: &Integer,
    tester: &PrimalityTester,
    monitor: &dyn SearchMonitor,
) -> Decomposed {
    let half = Integer::from(n / 2u32);
    let digits = bignum::digit_count(n);
    let mut p = Integer::from(2u32);
    while p <= half {
        if monitor.is_stop_requested() {
            return Decomposed::Stopped;
        }
        let q = Integer::from(n - &p);
        let prime = tester.is_probable_prime(&q);
        monitor.candidate_tested(Candidate::from_integer(&p, digits));
        if prime {
            return Decomposed::Pair(p, q);
        }
        p = tester.next_probable_prime(&p);
    }
    Decomposed::NoPair
}

pub fn search(
    targets: &[Integer],
    tester: &PrimalityTester,
    monitor: &dyn SearchMonitor,
) -> Result<Outcome, SearchError> {
    let mut decompositions = Vec::with_capacity(targets.len());
    let mut all_found = true;
    for n in targets {
        if *n <= 2 || n.is_odd() {
            return Err(SearchError::invalid(format!(
                "goldbach target {} must be even and greater than 2",
                n
            )));
        }
        let pair = match decompose(n, tester, monitor) {
            Decomposed::Stopped => return Ok(Outcome::Cancelled),
            Decomposed::Pair(p, q) => {
                monitor.prime_found(&format!("{} = {} + {}", n, p, q));
                Some([bignum::to_decimal(&p), bignum::to_decimal(&q)])
            }
            Decomposed::NoPair => {
                all_found = false;
                None
            }
        };
        decompositions.push(GoldbachDecomposition {
            number: bignum::to_decimal(n),
            pair,
        });
    }
    let result = SearchResult::Goldbach { decompositions };
    Ok(if all_found {
        Outcome::Found(result)
    } else {
        Outcome::Exhausted(Some(result))
    })
}
