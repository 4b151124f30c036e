//! # Outcome — Search Results and Candidate Descriptors
//!
//! `SearchResult` is the payload a family produces, tagged by `"family"` like
//! the request. Every large numeral is an exact decimal string; small indices
//! (`n`, `p`) stay JSON integers. Results carry no timing, so running the same
//! request twice serializes to the same bytes.
//!
//! `Outcome` is what a search function returns to its caller: a result, an
//! exhausted search (possibly with partial results), or an honoured stop
//! request.

use rug::Integer;
use serde::{Deserialize, Serialize};

use crate::bignum;
use crate::search_params::Family;

/// The candidate a search just tested: a family-specific index and the
/// number of decimal digits of the candidate value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub index: String,
    pub digits: u64,
}

impl Candidate {
    pub fn new(index: u64, digits: u64) -> Self {
        Candidate {
            index: index.to_string(),
            digits,
        }
    }

    pub fn from_integer(index: &Integer, digits: u64) -> Self {
        Candidate {
            index: bignum::to_decimal(index),
            digits,
        }
    }

    /// The index as a `u64` when it fits.
    pub fn small_index(&self) -> Option<u64> {
        self.index.parse().ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepunitPrime {
    pub n: u64,
    pub repunit: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MersennePrime {
    pub p: u64,
    pub mersenne: String,
    pub proof: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfectNumber {
    pub p: u64,
    pub perfect: String,
    pub digits: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldbachDecomposition {
    pub number: String,
    /// `None` when no pair exists below `number / 2`.
    pub pair: Option<[String; 2]>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum SearchResult {
    Kaprekar {
        n: u64,
        value: String,
        digits: u64,
    },
    Repunit {
        repunit_primes: Vec<RepunitPrime>,
    },
    Mersenne {
        mersenne_primes: Vec<MersennePrime>,
    },
    BetweenSquares {
        primes: Vec<String>,
    },
    Palindromic {
        value: String,
        digits: u64,
    },
    Perfect {
        perfect_numbers: Vec<PerfectNumber>,
    },
    Goldbach {
        decompositions: Vec<GoldbachDecomposition>,
    },
}

impl SearchResult {
    pub fn family(&self) -> Family {
        match self {
            SearchResult::Kaprekar { .. } => Family::Kaprekar,
            SearchResult::Repunit { .. } => Family::Repunit,
            SearchResult::Mersenne { .. } => Family::Mersenne,
            SearchResult::BetweenSquares { .. } => Family::BetweenSquares,
            SearchResult::Palindromic { .. } => Family::Palindromic,
            SearchResult::Perfect { .. } => Family::Perfect,
            SearchResult::Goldbach { .. } => Family::Goldbach,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Found(SearchResult),
    /// The search space ran out. Collecting families report what they
    /// gathered; first-hit families have nothing to report.
    Exhausted(Option<SearchResult>),
    Cancelled,
}

impl Outcome {
    pub fn result(&self) -> Option<&SearchResult> {
        match self {
            Outcome::Found(r) => Some(r),
            Outcome::Exhausted(r) => r.as_ref(),
            Outcome::Cancelled => None,
        }
    }

    pub fn into_result(self) -> Option<SearchResult> {
        match self {
            Outcome::Found(r) => Some(r),
            Outcome::Exhausted(r) => r,
            Outcome::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kaprekar_result_wire_shape() {
        let r = SearchResult::Kaprekar {
            n: 10,
            value: "12345678910987654321".into(),
            digits: 20,
        };
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"family": "kaprekar", "n": 10, "value": "12345678910987654321", "digits": 20})
        );
    }

    #[test]
    fn goldbach_missing_pair_is_null() {
        let r = SearchResult::Goldbach {
            decompositions: vec![
                GoldbachDecomposition {
                    number: "100".into(),
                    pair: Some(["3".into(), "97".into()]),
                },
                GoldbachDecomposition {
                    number: "8".into(),
                    pair: None,
                },
            ],
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["decompositions"][0]["pair"], json!(["3", "97"]));
        assert!(v["decompositions"][1]["pair"].is_null());
    }

    #[test]
    fn result_family_matches_tag() {
        let r = SearchResult::BetweenSquares { primes: vec![] };
        assert_eq!(r.family(), Family::BetweenSquares);
        assert_eq!(serde_json::to_value(&r).unwrap()["family"], "between_squares");
    }

    #[test]
    fn candidate_index_keeps_large_values_exact() {
        let big = bignum::pow2(100);
        let c = Candidate::from_integer(&big, 31);
        assert_eq!(c.index, "1267650600228229401496703205376");
        assert_eq!(c.small_index(), None);
        assert_eq!(Candidate::new(2203, 664).small_index(), Some(2203));
    }

    #[test]
    fn outcome_result_access() {
        let r = SearchResult::Palindromic {
            value: "101".into(),
            digits: 3,
        };
        assert_eq!(Outcome::Found(r.clone()).result(), Some(&r));
        assert_eq!(Outcome::Exhausted(None).into_result(), None);
        assert_eq!(Outcome::Cancelled.result(), None);
    }
}
