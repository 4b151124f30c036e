//! # Bignum — Arbitrary-Precision Kernel
//!
//! Every search family works on `rug::Integer`, a GMP-backed signed integer.
//! Addition, subtraction and multiplication are the `rug` operator overloads;
//! GMP switches from schoolbook to Karatsuba, Toom-Cook and finally FFT
//! multiplication as operands grow, so squaring a million-digit candidate stays
//! quasi-linear. This module adds the few constructors and conversions the
//! families need on top of that:
//!
//! - exact decimal parse (`parse_decimal`) and format (`to_decimal`),
//! - exact and estimated decimal digit counts,
//! - power, shift and special-form constructors (`pow2`, `mersenne`, `repunit`),
//! - decimal concatenation of a sequence of small integers.
//!
//! Arithmetic is total. The only failures are malformed decimal text and
//! exponents that do not fit GMP's `u32` exponent argument, both reported as
//! `SearchError::InvalidInput`. Concatenation parses text it built itself and
//! reports a parse failure as `SearchError::Internal`.

use rug::ops::Pow;
use rug::Integer;
use std::cmp::Ordering;
use std::fmt::Write;

use crate::error::SearchError;

/// Parse a canonical base-10 integer: an optional `-` followed by ASCII digits.
///
/// Whitespace, `+`, underscores and empty input are rejected rather than
/// silently normalised, since every numeral on the wire is meant to be exact.
pub fn parse_decimal(s: &str) -> Result<Integer, SearchError> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() {
        return Err(SearchError::invalid(format!("empty decimal literal {:?}", s)));
    }
    if let Some(bad) = digits.bytes().find(|b| !b.is_ascii_digit()) {
        return Err(SearchError::invalid(format!(
            "unexpected character {:?} in decimal literal",
            bad as char
        )));
    }
    s.parse::<Integer>()
        .map_err(|e| SearchError::invalid(format!("malformed decimal literal: {}", e)))
}

/// Exact decimal representation (no grouping, no exponent, `-` for negatives).
pub fn to_decimal(n: &Integer) -> String {
    n.to_string_radix(10)
}

/// Narrow an exponent to the `u32` range GMP's power functions accept.
pub fn checked_exponent(e: u64) -> Result<u32, SearchError> {
    u32::try_from(e).map_err(|_| SearchError::invalid(format!("exponent {} exceeds u32 range", e)))
}

/// `base^exp`.
pub fn pow(base: &Integer, exp: u32) -> Integer {
    Integer::from(base.pow(exp))
}

/// `n · 2^bits`, the `1 << k` style construction used for powers of two.
pub fn shl_bits(n: &Integer, bits: u32) -> Integer {
    n.clone() << bits
}

/// `2^k`.
pub fn pow2(k: u32) -> Integer {
    Integer::from(1u32) << k
}

/// Mersenne number `2^p − 1`.
pub fn mersenne(p: u32) -> Integer {
    pow2(p) - 1u32
}

/// Base-10 repunit `R(n) = (10^n − 1) / 9`, the integer written as n ones.
pub fn repunit(n: u32) -> Integer {
    (Integer::from(10u32).pow(n) - 1u32) / 9u32
}

/// Concatenate the decimal representations of `parts` and parse the result.
///
/// Building the text first and handing it to GMP's subquadratic radix
/// conversion is much cheaper than multiplying by powers of ten per part.
/// The text is digits only, so a parse failure is an internal error.
pub fn concat_decimal<I>(parts: I) -> Result<Integer, SearchError>
where
    I: IntoIterator<Item = u64>,
{
    let mut text = String::new();
    for part in parts {
        // Writing to a String cannot fail.
        let _ = write!(text, "{}", part);
    }
    if text.is_empty() {
        return Ok(Integer::new());
    }
    Integer::from_str_radix(&text, 10).map_err(|e| {
        SearchError::Internal(format!(
            "concatenated decimal text of {} digits did not parse: {}",
            text.len(),
            e
        ))
    })
}

/// Estimate decimal digit count from the bit length. Never below the exact
/// count, and at most one above it.
pub fn estimate_digits(n: &Integer) -> u64 {
    let bits = n.significant_bits();
    if bits == 0 {
        return 1;
    }
    (bits as f64 * std::f64::consts::LOG10_2) as u64 + 1
}

/// Exact decimal digit count of `|n|` (zero has one digit).
///
/// Corrects the bit-length estimate with a single comparison against a power
/// of ten instead of formatting the whole number.
pub fn digit_count(n: &Integer) -> u64 {
    let est = estimate_digits(n);
    if est <= 1 {
        return 1;
    }
    let floor = Integer::from(10u32).pow((est - 1) as u32);
    if n.cmp_abs(&floor) == Ordering::Less {
        est - 1
    } else {
        est
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_canonical_literals() {
        assert_eq!(parse_decimal("0").unwrap(), 0);
        assert_eq!(parse_decimal("-17").unwrap(), -17);
        assert_eq!(
            parse_decimal("12345678910987654321").unwrap(),
            Integer::from(12345678910987654321u64)
        );
    }

    #[test]
    fn parse_rejects_malformed_literals() {
        for bad in ["", "-", "+5", " 5", "5 ", "1_000", "12a", "0x10", "1e9"] {
            let err = parse_decimal(bad).unwrap_err();
            assert!(
                matches!(err, SearchError::InvalidInput(_)),
                "{:?} should be invalid, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn decimal_round_trip_large_value() {
        let m = mersenne(2203);
        let text = to_decimal(&m);
        assert_eq!(text.len(), 664);
        assert_eq!(parse_decimal(&text).unwrap(), m);
    }

    #[test]
    fn digit_count_exact_at_power_of_ten_boundaries() {
        for k in 1..200u32 {
            let p = Integer::from(10u32).pow(k);
            assert_eq!(digit_count(&p), k as u64 + 1, "10^{}", k);
            let below = Integer::from(&p - 1u32);
            assert_eq!(digit_count(&below), k as u64, "10^{} - 1", k);
        }
        assert_eq!(digit_count(&Integer::new()), 1);
        assert_eq!(digit_count(&Integer::from(-999)), 3);
    }

    #[test]
    fn estimate_is_upper_bound_within_one() {
        for v in [1u64, 9, 10, 99, 100, 1 << 40, u64::MAX] {
            let n = Integer::from(v);
            let exact = v.to_string().len() as u64;
            let est = estimate_digits(&n);
            assert!(est == exact || est == exact + 1, "{}: est {}", v, est);
        }
    }

    #[test]
    fn special_forms() {
        assert_eq!(pow2(10), 1024);
        assert_eq!(mersenne(7), 127);
        assert_eq!(repunit(1), 1);
        assert_eq!(repunit(5), 11111);
        assert_eq!(shl_bits(&Integer::from(3), 4), 48);
        assert_eq!(pow(&Integer::from(7), 3), 343);
    }

    #[test]
    fn concat_parses_joined_text() {
        assert_eq!(concat_decimal([1u64, 23, 456]).unwrap(), 123456);
        assert_eq!(concat_decimal(std::iter::empty::<u64>()).unwrap(), 0);
    }

    #[test]
    fn checked_exponent_rejects_overflow() {
        assert_eq!(checked_exponent(2203).unwrap(), 2203);
        assert!(checked_exponent(u64::from(u32::MAX) + 1).is_err());
    }
}
