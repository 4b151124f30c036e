//! # Sieve — Small Prime Generation
//!
//! Exponent and index filtering for the repunit and Mersenne families, and the
//! trial-division table of the primality tester, all need the primes below a
//! modest bound. An odd-only sieve of Eratosthenes covers that: one byte per odd
//! integer, O(n log log n) time.
//!
//! Both exponent filters rest on the same algebraic fact: if `n = ab` then
//! `R(a)` divides `R(n)` and `2^a − 1` divides `2^n − 1`, so only prime indices
//! can give primes.

/// All primes `<= limit`, ascending.
pub fn generate_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return Vec::new();
    }
    let mut primes = vec![2u64];
    if limit < 3 {
        return primes;
    }

    // Index i stands for the odd number 2i + 1.
    let len = ((limit - 1) / 2 + 1) as usize;
    let mut composite = vec![false; len];
    let mut i = 1usize;
    while (2 * i + 1) * (2 * i + 1) <= limit as usize {
        if !composite[i] {
            let p = 2 * i + 1;
            let mut j = (p * p - 1) / 2;
            while j < len {
                composite[j] = true;
                j += p;
            }
        }
        i += 1;
    }

    primes.extend(
        composite
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, &c)| !c)
            .map(|(i, _)| 2 * i as u64 + 1),
    );
    primes
}

/// Primes in the inclusive range `[lo, hi]`, ascending.
pub fn primes_in_range(lo: u64, hi: u64) -> Vec<u64> {
    if hi < lo {
        return Vec::new();
    }
    generate_primes(hi).into_iter().filter(|&p| p >= lo).collect()
}

/// Deterministic primality for small `n` by trial division.
pub fn is_small_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
