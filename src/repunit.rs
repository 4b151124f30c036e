//! # Repunit — Prime Repunits R(N) = (10^N − 1) / 9
//!
//! A repunit is the integer written with `N` ones. If `N = ab` then `R(a)`
//! divides `R(N)`, so only prime `N` can give a prime; the exponents come
//! from the sieve. Prime repunits are known for `N = 2, 19, 23, 317, 1031, …`
//! (OEIS A004023).
//!
//! The search collects every hit up to `bound` and never stops early.
//! Exponents are tested in chunks fanned out over the rayon pool; every
//! candidate checks the stop flag first, and results are gathered in
//! ascending `N` whatever order the workers finish in.

use crate::bignum;
use crate::error::SearchError;
use crate::outcome::{Candidate, Outcome, RepunitPrime, SearchResult};
use crate::primality::PrimalityTester;
use crate::sieve;
use crate::{collect_hits_parallel, SearchMonitor};

pub fn search(
    bound: u64,
    tester: &PrimalityTester,
    monitor: &dyn SearchMonitor,
) -> Result<Outcome, SearchError> {
    let exponents = sieve::generate_primes(bound)
        .into_iter()
        .map(bignum::checked_exponent)
        .collect::<Result<Vec<u32>, _>>()?;

    let tested = collect_hits_parallel(&exponents, monitor, |&n| {
        let r = bignum::repunit(n);
        let prime = tester.is_probable_prime(&r);
        monitor.candidate_tested(Candidate::new(n as u64, n as u64));
        if !prime {
            return None;
        }
        monitor.prime_found(&format!("R({})", n));
        Some(RepunitPrime {
            n: n as u64,
            repunit: bignum::to_decimal(&r),
        })
    });
    let Some(hits) = tested else {
        return Ok(Outcome::Cancelled);
    };

    let found = !hits.is_empty();
    let result = SearchResult::Repunit {
        repunit_primes: hits,
    };
    Ok(if found {
        Outcome::Found(result)
    } else {
        Outcome::Exhausted(Some(result))
    })
}
