//! # Palindromic — Smallest Palindromic Prime of a Given Size
//!
//! Finds the smallest base-10 palindromic prime with at least `min_digits`
//! digits, enumerating palindromes by their leading half.
//!
//! ## Algorithm
//!
//! 1. **Odd lengths only**: an even-length palindrome is divisible by 11, so
//!    the length is `L = min_digits` rounded up to the next odd number.
//! 2. **Half-digit generation**: an `L`-digit palindrome is determined by its
//!    first `h = (L + 1) / 2` digits. Prefixes are visited in ascending order
//!    and mirrored without their last digit, so palindromes come out in
//!    ascending numeric order too.
//! 3. **Leading digit blocks**: the first digit is also the last. Blocks led by
//!    2, 4, 5, 6 or 8 give multiples of 2 or 5 and are skipped whole.
//! 4. **Modular digit filter**: the palindrome is reduced modulo each small
//!    prime by Horner's rule over the digit array, so most composites are
//!    rejected before a big integer is built.
//! 5. When a length is exhausted, `L += 2`. The search is unbounded unless
//!    `max_digits` is given.
//!
//! Every palindrome visited is one quantum. Its progress index is the prefix.
//!
//! ## References
//!
//! - OEIS: [A002385](https://oeis.org/A002385) — Palindromic primes.
//! - Harvey Dubner, "Palindromic Primes", Journal of Recreational Mathematics, 1989.

use rug::Integer;
use std::sync::OnceLock;

use crate::error::SearchError;
use crate::outcome::{Candidate, Outcome, SearchResult};
use crate::primality::PrimalityTester;
use crate::search_params::abbreviate;
use crate::sieve;
use crate::SearchMonitor;

const FILTER_LIMIT: u64 = 1_000;
const LEADING_DIGITS: [u8; 4] = [1, 3, 7, 9];

/// Odd primes other than 5 used by the digit filter.
fn filter_primes() -> &'static [u64] {
    static PRIMES: OnceLock<Vec<u64>> = OnceLock::new();
    PRIMES.get_or_init(|| {
        sieve::generate_primes(FILTER_LIMIT)
            .into_iter()
            .filter(|&p| p != 2 && p != 5)
            .collect()
    })
}

/// Increment a digit array by 1. Returns true on overflow.
#[inline]
fn increment_digits(digits: &mut [u8]) -> bool {
    for d in digits.iter_mut().rev() {
        *d += 1;
        if *d < 10 {
            return false;
        }
        *d = 0;
    }
    true
}

/// Mirror an odd-length palindrome's prefix: [a,b,c] -> [a,b,c,b,a].
fn mirror_to_palindrome(half: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.extend_from_slice(half);
    out.extend(half.iter().rev().skip(1));
}

/// Value of a digit array mod `m` by Horner's rule.
#[inline]
fn digits_mod(digits: &[u8], m: u64) -> u64 {
    digits
        .iter()
        .fold(0u64, |r, &d| (r * 10 + d as u64) % m)
}

/// True if a filter prime smaller than the palindrome divides it.
fn is_filter_composite(digits: &[u8]) -> bool {
    // Primes at or above 10^(L-1) could equal the candidate itself.
    let min_value = 10u64.checked_pow(digits.len() as u32 - 1);
    filter_primes()
        .iter()
        .take_while(|&&p| min_value.map_or(true, |v| p < v))
        .any(|&p| digits_mod(digits, p) == 0)
}

fn digits_to_text(digits: &[u8]) -> String {
    digits.iter().map(|&d| char::from(b'0' + d)).collect()
}

pub fn search(
    min_digits: u64,
    max_digits: Option<u64>,
    tester: &PrimalityTester,
    monitor: &dyn SearchMonitor,
) -> Result<Outcome, SearchError> {
    if min_digits < 2 {
        return Err(SearchError::invalid("palindromes need at least two digits"));
    }
    let mut length = if min_digits % 2 == 1 {
        min_digits
    } else {
        min_digits + 1
    };

    let mut palindrome = Vec::new();
    loop {
        if max_digits.is_some_and(|max| length > max) {
            return Ok(Outcome::Exhausted(None));
        }
        let half_len = usize::try_from((length + 1) / 2)
            .map_err(|_| SearchError::invalid(format!("{} digits is too many", length)))?;

        for &lead in &LEADING_DIGITS {
            let mut half = vec![0u8; half_len];
            half[0] = lead;
            loop {
                if monitor.is_stop_requested() {
                    return Ok(Outcome::Cancelled);
                }
                mirror_to_palindrome(&half, &mut palindrome);
                let prime = !is_filter_composite(&palindrome) && {
                    let value = Integer::from_str_radix(&digits_to_text(&palindrome), 10)
                        .map_err(|e| SearchError::Internal(e.to_string()))?;
                    tester.is_probable_prime(&value)
                };
                monitor.candidate_tested(Candidate {
                    index: digits_to_text(&half),
                    digits: length,
                });
                if prime {
                    let value = digits_to_text(&palindrome);
                    monitor.prime_found(&abbreviate(&value));
                    return Ok(Outcome::Found(SearchResult::Palindromic {
                        value,
                        digits: length,
                    }));
                }
                if increment_digits(&mut half[1..]) {
                    break;
                }
            }
        }
        length += 2;
    }
}
