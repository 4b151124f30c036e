//! # Primality — Probabilistic Tester and Lucas–Lehmer Certification
//!
//! Every search family funnels its candidates through [`PrimalityTester`].
//!
//! ## Pipeline
//!
//! 1. **Trivial rejects**: `n < 2` and even `n > 2` are composite.
//! 2. **Trial division** by the 168 primes below 1000. A candidate below
//!    1000² that survives is certainly prime.
//! 3. **Two-round pre-screen**: most composites fail within two Miller–Rabin
//!    rounds, so the full test only runs on survivors.
//! 4. **GMP `mpz_probab_prime_p`**: Baillie–PSW followed by `rounds − 24`
//!    Miller–Rabin rounds. GMP draws its witnesses from an internally seeded
//!    generator, so the verdict for a given `n` is reproducible.
//!
//! ## Error Bound
//!
//! A composite is reported as probably prime with probability at most
//! `4^−rounds`. The default of 25 rounds bounds it by 8.9·10⁻¹⁶; no
//! Baillie–PSW pseudoprime is known at all.
//!
//! ## Mersenne Numbers
//!
//! `is_mersenne_prime` runs the Lucas–Lehmer test, which is deterministic:
//! `2^p − 1` (p an odd prime) is prime iff `s_{p−2} ≡ 0` where `s_0 = 4` and
//! `s_{k+1} = s_k² − 2 (mod 2^p − 1)`. Reduction modulo `2^p − 1` needs no
//! division: `x ≡ (x mod 2^p) + (x >> p)`.
//!
//! ## References
//!
//! - GMP manual, "Number Theoretic Functions" (`mpz_probab_prime_p`).
//! - D.H. Lehmer, "An Extended Theory of Lucas' Functions", Annals of
//!   Mathematics, 31(3), 1930.

use rug::integer::IsPrime;
use rug::Integer;
use std::sync::OnceLock;

use crate::{bignum, sieve};

/// Default witness rounds: error ≤ 4^-25.
pub const DEFAULT_ROUNDS: u32 = 25;

const TRIAL_LIMIT: u64 = 1_000;

fn trial_primes() -> &'static [u32] {
    static PRIMES: OnceLock<Vec<u32>> = OnceLock::new();
    PRIMES.get_or_init(|| {
        sieve::generate_primes(TRIAL_LIMIT)
            .into_iter()
            .map(|p| p as u32)
            .collect()
    })
}

/// Verdict of a primality check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primality {
    Composite,
    /// Passed the probabilistic test; error bounded by `4^-rounds`.
    Probable,
    /// Proven prime (small enough for trial division, or Lucas–Lehmer).
    Certain,
}

impl Primality {
    pub fn is_prime(self) -> bool {
        self != Primality::Composite
    }

    pub fn proof_label(self) -> &'static str {
        match self {
            Primality::Composite => "composite",
            Primality::Probable => "probabilistic",
            Primality::Certain => "deterministic",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PrimalityTester {
    rounds: u32,
}

impl Default for PrimalityTester {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

impl PrimalityTester {
    /// Zero rounds would skip the probabilistic test entirely; clamp to one.
    pub fn new(rounds: u32) -> Self {
        PrimalityTester {
            rounds: rounds.max(1),
        }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Upper bound on the probability that a composite passes.
    pub fn error_bound(&self) -> f64 {
        0.25f64.powi(self.rounds as i32)
    }

    pub fn is_probable_prime(&self, n: &Integer) -> bool {
        self.check(n).is_prime()
    }

    pub fn check(&self, n: &Integer) -> Primality {
        if *n < 2 {
            return Primality::Composite;
        }
        if n.is_even() {
            return if *n == 2 {
                Primality::Certain
            } else {
                Primality::Composite
            };
        }
        if let Some(verdict) = trial_division(n) {
            return verdict;
        }
        match screened_test(n, self.rounds) {
            IsPrime::No => Primality::Composite,
            IsPrime::Probably => Primality::Probable,
            IsPrime::Yes => Primality::Certain,
        }
    }

    /// Smallest probable prime strictly greater than `n`, stepping over even
    /// candidates.
    pub fn next_probable_prime(&self, n: &Integer) -> Integer {
        if *n < 2 {
            return Integer::from(2u32);
        }
        let mut c = Integer::from(n + 1u32);
        if c.is_even() {
            if c == 2 {
                return c;
            }
            c += 1u32;
        }
        while !self.is_probable_prime(&c) {
            c += 2u32;
        }
        c
    }

    /// Lucas–Lehmer test of `2^p − 1`. Deterministic; composite exponents are
    /// rejected without running the recurrence.
    pub fn is_mersenne_prime(&self, p: u32) -> bool {
        if p == 2 {
            return true;
        }
        if !sieve::is_small_prime(p as u64) {
            return false;
        }
        let m = bignum::mersenne(p);
        // Cheap reject before the p − 2 squarings.
        if matches!(trial_division(&m), Some(Primality::Composite)) {
            return false;
        }
        lucas_lehmer_residue(p, &m) == 0
    }
}

/// `Some(verdict)` if trial division settles the question, `None` otherwise.
fn trial_division(n: &Integer) -> Option<Primality> {
    for &p in trial_primes() {
        if n.is_divisible_u(p) {
            return Some(if *n == p {
                Primality::Certain
            } else {
                Primality::Composite
            });
        }
    }
    if *n < TRIAL_LIMIT * TRIAL_LIMIT {
        return Some(Primality::Certain);
    }
    None
}

fn screened_test(n: &Integer, rounds: u32) -> IsPrime {
    if rounds > 2 && n.is_probably_prime(2) == IsPrime::No {
        return IsPrime::No;
    }
    n.is_probably_prime(rounds)
}

/// Final Lucas–Lehmer residue `s_{p−2} mod 2^p − 1`.
fn lucas_lehmer_residue(p: u32, m: &Integer) -> Integer {
    let mut s = Integer::from(4u32);
    for _ in 0..p - 2 {
        s.square_mut();
        s -= 2u32;
        s = reduce_mod_mersenne(s, p, m);
    }
    s
}

/// Reduce `x` (which may be slightly negative) modulo `m = 2^p − 1`.
fn reduce_mod_mersenne(mut x: Integer, p: u32, m: &Integer) -> Integer {
    if x < 0 {
        x += m;
    }
    while x.significant_bits() > p {
        let high = x.clone() >> p;
        x.keep_bits_mut(p);
        x += high;
    }
    if x == *m {
        x = Integer::new();
    }
    x
}
