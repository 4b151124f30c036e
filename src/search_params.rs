//! # SearchParams — Typed Requests for the Seven Search Families
//!
//! `SearchRequest` is the closed set of request shapes the service accepts,
//! serialized as JSON tagged by `"family"`. Every field has the documented
//! default so `{"family": "mersenne"}` reproduces the reference search.
//!
//! `validate` enforces each family's domain before a job may be created:
//!
//! | Family | Domain |
//! |--------|--------|
//! | kaprekar | `1000 <= start <= end <= 3000` |
//! | repunit | `2 <= bound <= 1040` |
//! | mersenne | `2 <= min_exp <= max_exp <= 100000` |
//! | between_squares | `0 <= lower < upper`, `1 <= count <= 1000` |
//! | palindromic | `2 <= min_digits <= max_digits`, `min_digits <= 10^7` |
//! | perfect | 1..=64 exponents, each in `[2, 100000]` |
//! | goldbach | 1..=64 targets, each even and `> 2` |

use rug::ops::Pow;
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bignum;
use crate::error::SearchError;

pub const KAPREKAR_MIN_N: u64 = 1000;
pub const KAPREKAR_MAX_N: u64 = 3000;
pub const REPUNIT_MIN_BOUND: u64 = 2;
pub const REPUNIT_MAX_BOUND: u64 = 1040;
pub const MERSENNE_MIN_EXP: u64 = 2;
pub const MERSENNE_MAX_EXP: u64 = 100_000;
pub const BETWEEN_SQUARES_MAX_COUNT: usize = 1000;
pub const PALINDROME_MIN_DIGITS: u64 = 2;
pub const PALINDROME_MAX_DIGITS: u64 = 10_000_000;
pub const MAX_LIST_LEN: usize = 64;

/// The seven search families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Kaprekar,
    Repunit,
    Mersenne,
    BetweenSquares,
    Palindromic,
    Perfect,
    Goldbach,
}

impl Family {
    pub const ALL: [Family; 7] = [
        Family::Kaprekar,
        Family::Repunit,
        Family::Mersenne,
        Family::BetweenSquares,
        Family::Palindromic,
        Family::Perfect,
        Family::Goldbach,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Kaprekar => "kaprekar",
            Family::Repunit => "repunit",
            Family::Mersenne => "mersenne",
            Family::BetweenSquares => "between_squares",
            Family::Palindromic => "palindromic",
            Family::Perfect => "perfect",
            Family::Goldbach => "goldbach",
        }
    }

    /// Families whose progress is worth streaming: open-ended or long scans
    /// that stop at the first hit.
    pub fn is_streaming(self) -> bool {
        matches!(self, Family::Kaprekar | Family::Palindromic)
    }

    /// The request with every parameter at its default.
    pub fn default_request(self) -> SearchRequest {
        match self {
            Family::Kaprekar => SearchRequest::Kaprekar {
                start: KAPREKAR_MIN_N,
                end: KAPREKAR_MAX_N,
            },
            Family::Repunit => SearchRequest::Repunit {
                bound: REPUNIT_MAX_BOUND,
            },
            Family::Mersenne => SearchRequest::Mersenne {
                min_exp: default_min_exp(),
                max_exp: default_max_exp(),
            },
            Family::BetweenSquares => SearchRequest::BetweenSquares {
                lower: default_lower_base(),
                upper: default_upper_base(),
                count: default_prime_count(),
            },
            Family::Palindromic => SearchRequest::Palindromic {
                min_digits: default_min_digits(),
                max_digits: None,
            },
            Family::Perfect => SearchRequest::Perfect {
                exponents: default_perfect_exponents(),
            },
            Family::Goldbach => SearchRequest::Goldbach {
                numbers: default_goldbach_numbers(),
            },
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum SearchRequest {
    /// Concatenation `1..n` then `n-1..1`, first probable prime for `n` in `[start, end]`.
    Kaprekar {
        #[serde(default = "default_kaprekar_start")]
        start: u64,
        #[serde(default = "default_kaprekar_end")]
        end: u64,
    },
    /// Every prime repunit `R(N)` with `N <= bound`.
    Repunit {
        #[serde(default = "default_repunit_bound")]
        bound: u64,
    },
    /// Every Mersenne prime `2^p - 1` with `p` in `[min_exp, max_exp]`.
    Mersenne {
        #[serde(default = "default_min_exp")]
        min_exp: u64,
        #[serde(default = "default_max_exp")]
        max_exp: u64,
    },
    /// The first `count` primes above `lower^2`, stopping at `upper^2`.
    BetweenSquares {
        #[serde(default = "default_lower_base")]
        lower: String,
        #[serde(default = "default_upper_base")]
        upper: String,
        #[serde(default = "default_prime_count")]
        count: usize,
    },
    /// The smallest palindromic prime with at least `min_digits` digits.
    Palindromic {
        #[serde(default = "default_min_digits")]
        min_digits: u64,
        #[serde(default)]
        max_digits: Option<u64>,
    },
    /// `2^(p-1) (2^p - 1)` for each exponent whose Mersenne number is prime.
    Perfect {
        #[serde(default = "default_perfect_exponents")]
        exponents: Vec<u64>,
    },
    /// The first Goldbach pair `(p, N - p)` with ascending `p` for each target.
    Goldbach {
        #[serde(default = "default_goldbach_numbers")]
        numbers: Vec<String>,
    },
}

fn default_kaprekar_start() -> u64 {
    KAPREKAR_MIN_N
}

fn default_kaprekar_end() -> u64 {
    KAPREKAR_MAX_N
}

fn default_repunit_bound() -> u64 {
    REPUNIT_MAX_BOUND
}

fn default_min_exp() -> u64 {
    2201
}

fn default_max_exp() -> u64 {
    2299
}

fn default_lower_base() -> String {
    bignum::to_decimal(&bignum::mersenne(2203))
}

fn default_upper_base() -> String {
    bignum::to_decimal(&bignum::mersenne(2281))
}

fn default_prime_count() -> usize {
    4
}

fn default_min_digits() -> u64 {
    50
}

fn default_perfect_exponents() -> Vec<u64> {
    vec![2203, 2281]
}

fn default_goldbach_numbers() -> Vec<String> {
    vec![
        (Integer::from(10u32).pow(49u32) + 12u32).to_string(),
        (Integer::from(10u32).pow(50u32) + 88u32).to_string(),
    ]
}

impl SearchRequest {
    pub fn family(&self) -> Family {
        match self {
            SearchRequest::Kaprekar { .. } => Family::Kaprekar,
            SearchRequest::Repunit { .. } => Family::Repunit,
            SearchRequest::Mersenne { .. } => Family::Mersenne,
            SearchRequest::BetweenSquares { .. } => Family::BetweenSquares,
            SearchRequest::Palindromic { .. } => Family::Palindromic,
            SearchRequest::Perfect { .. } => Family::Perfect,
            SearchRequest::Goldbach { .. } => Family::Goldbach,
        }
    }

    /// Check the family's domain constraints. Nothing is computed yet.
    pub fn validate(&self) -> Result<(), SearchError> {
        match self {
            SearchRequest::Kaprekar { start, end } => {
                check_range("kaprekar n", *start, *end, KAPREKAR_MIN_N, KAPREKAR_MAX_N)
            }
            SearchRequest::Repunit { bound } => {
                if !(REPUNIT_MIN_BOUND..=REPUNIT_MAX_BOUND).contains(bound) {
                    return Err(SearchError::invalid(format!(
                        "repunit bound {} outside [{}, {}]",
                        bound, REPUNIT_MIN_BOUND, REPUNIT_MAX_BOUND
                    )));
                }
                Ok(())
            }
            SearchRequest::Mersenne { min_exp, max_exp } => check_range(
                "mersenne exponent",
                *min_exp,
                *max_exp,
                MERSENNE_MIN_EXP,
                MERSENNE_MAX_EXP,
            ),
            SearchRequest::BetweenSquares {
                lower,
                upper,
                count,
            } => {
                let lo = bignum::parse_decimal(lower)?;
                let hi = bignum::parse_decimal(upper)?;
                if lo < 0 {
                    return Err(SearchError::invalid("lower base must be non-negative"));
                }
                if lo >= hi {
                    return Err(SearchError::invalid("lower base must be below upper base"));
                }
                if *count == 0 || *count > BETWEEN_SQUARES_MAX_COUNT {
                    return Err(SearchError::invalid(format!(
                        "prime count {} outside [1, {}]",
                        count, BETWEEN_SQUARES_MAX_COUNT
                    )));
                }
                Ok(())
            }
            SearchRequest::Palindromic {
                min_digits,
                max_digits,
            } => {
                if *min_digits < PALINDROME_MIN_DIGITS || *min_digits > PALINDROME_MAX_DIGITS {
                    return Err(SearchError::invalid(format!(
                        "minimum digit count {} outside [{}, {}]",
                        min_digits, PALINDROME_MIN_DIGITS, PALINDROME_MAX_DIGITS
                    )));
                }
                if let Some(max) = max_digits {
                    if max < min_digits {
                        return Err(SearchError::invalid(format!(
                            "maximum digit count {} below minimum {}",
                            max, min_digits
                        )));
                    }
                }
                Ok(())
            }
            SearchRequest::Perfect { exponents } => {
                check_list_len("exponent", exponents.len())?;
                for &p in exponents {
                    if !(MERSENNE_MIN_EXP..=MERSENNE_MAX_EXP).contains(&p) {
                        return Err(SearchError::invalid(format!(
                            "perfect-number exponent {} outside [{}, {}]",
                            p, MERSENNE_MIN_EXP, MERSENNE_MAX_EXP
                        )));
                    }
                }
                Ok(())
            }
            SearchRequest::Goldbach { numbers } => {
                check_list_len("goldbach target", numbers.len())?;
                for text in numbers {
                    let n = bignum::parse_decimal(text)?;
                    if n <= 2 || n.is_odd() {
                        return Err(SearchError::invalid(format!(
                            "goldbach target {} must be even and greater than 2",
                            text
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// One-line summary for logs. Long decimal parameters are abbreviated.
    pub fn describe(&self) -> String {
        match self {
            SearchRequest::Kaprekar { start, end } => format!("n=[{}..{}]", start, end),
            SearchRequest::Repunit { bound } => format!("N<={}", bound),
            SearchRequest::Mersenne { min_exp, max_exp } => format!("p=[{}..{}]", min_exp, max_exp),
            SearchRequest::BetweenSquares {
                lower,
                upper,
                count,
            } => format!(
                "lower={} upper={} count={}",
                abbreviate(lower),
                abbreviate(upper),
                count
            ),
            SearchRequest::Palindromic {
                min_digits,
                max_digits,
            } => match max_digits {
                Some(max) => format!("digits=[{}..{}]", min_digits, max),
                None => format!("digits>={}", min_digits),
            },
            SearchRequest::Perfect { exponents } => format!("p={:?}", exponents),
            SearchRequest::Goldbach { numbers } => format!(
                "N=[{}]",
                numbers.iter().map(|n| abbreviate(n)).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

fn check_range(what: &str, lo: u64, hi: u64, min: u64, max: u64) -> Result<(), SearchError> {
    if lo < min || hi > max {
        return Err(SearchError::invalid(format!(
            "{} range [{}, {}] outside [{}, {}]",
            what, lo, hi, min, max
        )));
    }
    if lo > hi {
        return Err(SearchError::invalid(format!(
            "{} range [{}, {}] is empty",
            what, lo, hi
        )));
    }
    Ok(())
}

fn check_list_len(what: &str, len: usize) -> Result<(), SearchError> {
    if len == 0 {
        return Err(SearchError::invalid(format!("at least one {} is required", what)));
    }
    if len > MAX_LIST_LEN {
        return Err(SearchError::invalid(format!(
            "at most {} {} values are accepted, got {}",
            MAX_LIST_LEN, what, len
        )));
    }
    Ok(())
}

/// `1234…(664 digits)…4127` style shortening for log lines.
pub fn abbreviate(decimal: &str) -> String {
    if decimal.len() <= 24 {
        return decimal.to_string();
    }
    format!(
        "{}…({} digits)…{}",
        &decimal[..6],
        decimal.len(),
        &decimal[decimal.len() - 6..]
    )
}
