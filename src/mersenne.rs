//! # Mersenne — Lucas–Lehmer Search over an Exponent Range
//!
//! `2^p − 1` can only be prime when `p` is prime, so the sieve supplies the
//! exponents in `[min_exp, max_exp]`. Each `M_p` is trial-divided and then
//! settled by the Lucas–Lehmer test (see `primality`), which is a proof, so
//! every hit is reported as deterministic.
//!
//! Like the repunit search this collects every hit, testing exponents in
//! parallel chunks with a stop check per candidate.

use crate::bignum;
use crate::error::SearchError;
use crate::outcome::{Candidate, MersennePrime, Outcome, SearchResult};
use crate::primality::PrimalityTester;
use crate::sieve;
use crate::{collect_hits_parallel, SearchMonitor};

pub const LUCAS_LEHMER_PROOF: &str = "deterministic (Lucas-Lehmer)";

/// Decimal digits of `2^p − 1`, equal to those of `2^p` since no power of two
/// is a power of ten.
pub fn mersenne_digits(p: u32) -> u64 {
    (p as f64 * std::f64::consts::LOG10_2) as u64 + 1
}

pub fn search(
    min_exp: u64,
    max_exp: u64,
    tester: &PrimalityTester,
    monitor: &dyn SearchMonitor,
) -> Result<Outcome, SearchError> {
    let exponents = sieve::primes_in_range(min_exp, max_exp)
        .into_iter()
        .map(bignum::checked_exponent)
        .collect::<Result<Vec<u32>, _>>()?;

    let tested = collect_hits_parallel(&exponents, monitor, |&p| {
        let prime = tester.is_mersenne_prime(p);
        monitor.candidate_tested(Candidate::new(p as u64, mersenne_digits(p)));
        if !prime {
            return None;
        }
        monitor.prime_found(&format!("2^{} - 1", p));
        Some(MersennePrime {
            p: p as u64,
            mersenne: bignum::to_decimal(&bignum::mersenne(p)),
            proof: LUCAS_LEHMER_PROOF.to_string(),
        })
    });
    let Some(hits) = tested else {
        return Ok(Outcome::Cancelled);
    };

    let found = !hits.is_empty();
    let result = SearchResult::Mersenne {
        mersenne_primes: hits,
    };
    Ok(if found {
        Outcome::Found(result)
    } else {
        Outcome::Exhausted(Some(result))
    })
}
