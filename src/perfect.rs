//! # Perfect — Even Perfect Numbers from Mersenne Primes
//!
//! By the Euclid–Euler theorem every even perfect number is
//! `2^(p−1) · (2^p − 1)` with `2^p − 1` prime. For each requested exponent the
//! Mersenne factor is first certified by Lucas–Lehmer; an exponent whose
//! Mersenne number is composite fails the job. The product is built as a
//! single shift, `(2^p − 1) << (p − 1)`.

use crate::bignum;
use crate::error::SearchError;
use crate::mersenne::mersenne_digits;
use crate::outcome::{Candidate, Outcome, PerfectNumber, SearchResult};
use crate::primality::PrimalityTester;
use crate::SearchMonitor;

pub fn search(
    exponents: &[u64],
    tester: &PrimalityTester,
    monitor: &dyn SearchMonitor,
) -> Result<Outcome, SearchError> {
    let mut perfect_numbers = Vec::with_capacity(exponents.len());
    for &exp in exponents {
        if monitor.is_stop_requested() {
            return Ok(Outcome::Cancelled);
        }
        let p = bignum::checked_exponent(exp)?;
        if p < 2 {
            return Err(SearchError::invalid(format!("exponent {} is below 2", p)));
        }
        let prime = tester.is_mersenne_prime(p);
        monitor.candidate_tested(Candidate::new(exp, mersenne_digits(p)));
        if !prime {
            return Err(SearchError::PreconditionFailed(format!(
                "2^{} - 1 is not prime",
                p
            )));
        }
        let perfect = bignum::shl_bits(&bignum::mersenne(p), p - 1);
        monitor.prime_found(&format!("2^{} - 1", p));
        perfect_numbers.push(PerfectNumber {
            p: exp,
            perfect: bignum::to_decimal(&perfect),
            digits: bignum::digit_count(&perfect),
        });
    }
    Ok(Outcome::Found(SearchResult::Perfect { perfect_numbers }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingMonitor;
    use crate::Unmonitored;
    use rug::Integer;

    fn numbers(exponents: &[u64]) -> Vec<PerfectNumber> {
        match search(exponents, &PrimalityTester::default(), &Unmonitored).unwrap() {
            Outcome::Found(SearchResult::Perfect { perfect_numbers }) => perfect_numbers,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn first_four_perfect_numbers() {
        let values: Vec<String> = numbers(&[2, 3, 5, 7])
            .into_iter()
            .map(|n| n.perfect)
            .collect();
        assert_eq!(values, vec!["6", "28", "496", "8128"]);
    }

    #[test]
    fn request_order_is_kept() {
        let ps: Vec<u64> = numbers(&[7, 2]).iter().map(|n| n.p).collect();
        assert_eq!(ps, vec![7, 2]);
    }

    #[test]
    fn default_exponents_give_large_perfect_numbers() {
        let found = numbers(&[2203, 2281]);
        assert_eq!(found[0].digits, 1327);
        assert_eq!(found[1].digits, 1373);
        assert_eq!(found[0].perfect.len() as u64, found[0].digits);

        // N / M_p = 2^(p-1)
        let n = bignum::parse_decimal(&found[0].perfect).unwrap();
        let m = bignum::mersenne(2203);
        assert_eq!(Integer::from(&n / &m), bignum::pow2(2202));
    }

    #[test]
    fn perfect_number_equals_sum_of_proper_divisors() {
        for pn in numbers(&[2, 3, 5, 7]) {
            let n: u64 = pn.perfect.parse().unwrap();
            let sum: u64 = (1..n).filter(|d| n % d == 0).sum();
            assert_eq!(sum, n, "{}", n);
        }
    }

    #[test]
    fn composite_mersenne_fails_precondition() {
        let monitor = RecordingMonitor::default();
        let err = search(&[2, 11], &PrimalityTester::default(), &monitor).unwrap_err();
        assert_eq!(
            err,
            SearchError::PreconditionFailed("2^11 - 1 is not prime".into())
        );
        assert_eq!(monitor.count(), 2);
    }

    #[test]
    fn stopped_construction_is_cancelled() {
        let monitor = RecordingMonitor::stopped();
        let outcome = search(&[2203], &PrimalityTester::default(), &monitor).unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
    }
}
