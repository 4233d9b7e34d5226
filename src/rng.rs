// src/rng.rs
//! Random Number Streams for Monte Carlo Simulations
//!
//! # Design Philosophy
//!
//! The path simulator never touches a process-global generator. Every call
//! receives a caller-owned stream of standard normal variates, so:
//! 1. **Reproducibility**: same stream state + same request shape → bit-identical paths
//! 2. **Parallel safety**: each worker owns its stream, nothing is shared
//! 3. **Substreams**: a stream can be advanced past `n` draws to give a
//!    worker a disjoint slice of one long sequence
//!
//! # Counter-Based RNG
//!
//! [`CounterRng`] maps `(seed, counter)` to a random word with the SplitMix64
//! finaliser. Advancing the stream is just moving the counter, so
//! [`NormalSource::discard`] is O(1) regardless of how far a worker skips.
//!
//! # Box-Muller Transform
//!
//! Converts uniform random variables to normal distributions:
//! ```text
//! Z = √(-2ln(U₁)) * cos(2πU₂)
//! ```
//! where U₁ ~ Uniform(0,1], U₂ ~ Uniform[0,1) and Z ~ N(0,1). Only the cosine
//! branch is used so that every variate owns exactly two counter values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

/// Default seed used when the caller does not choose one
pub const DEFAULT_SEED: u64 = 12345;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;
const TWO_POW_MINUS_53: f64 = 1.0 / 9_007_199_254_740_992.0;

/// A stream of independent standard normal variates.
pub trait NormalSource {
    /// Next N(0,1) draw
    fn next_normal(&mut self) -> f64;

    /// Fill `out` with consecutive draws
    fn fill_normal(&mut self, out: &mut [f64]) {
        for slot in out.iter_mut() {
            *slot = self.next_normal();
        }
    }

    /// Advance the stream past `n` draws without using them
    fn discard(&mut self, n: u64) {
        for _ in 0..n {
            self.next_normal();
        }
    }
}

/// Counter-based RNG for reproducible parallel simulations
///
/// # Algorithm
///
/// SplitMix64 evaluated at an arbitrary counter:
/// ```text
/// z = base_seed + counter * 0x9e3779b97f4a7c15
/// z = (z ⊕ (z >> 30)) * 0xbf58476d1ce4e5b9
/// z = (z ⊕ (z >> 27)) * 0x94d049bb133111eb
/// output = z ⊕ (z >> 31)
/// ```
///
/// # Thread Safety
///
/// Each pricing task owns its own instance; two instances with the same
/// seed and counter produce the same sequence on any thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterRng {
    base_seed: u64,
    counter: u64,
}

impl CounterRng {
    pub fn new(base_seed: u64, counter: u64) -> Self {
        Self { base_seed, counter }
    }

    pub fn seed(&self) -> u64 {
        self.base_seed
    }

    /// Number of words consumed so far (two per normal draw)
    pub fn position(&self) -> u64 {
        self.counter
    }

    pub fn next_u64(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(1);
        let mut z = self
            .base_seed
            .wrapping_add(self.counter.wrapping_mul(GOLDEN_GAMMA));
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
        z ^ (z >> 31)
    }

    /// Uniform on [0, 1)
    pub fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * TWO_POW_MINUS_53
    }

    /// Uniform on (0, 1], safe to take the logarithm of
    fn uniform_open_below(&mut self) -> f64 {
        ((self.next_u64() >> 11) as f64 + 1.0) * TWO_POW_MINUS_53
    }

    pub fn normal(&mut self) -> f64 {
        let u1 = self.uniform_open_below();
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl NormalSource for CounterRng {
    fn next_normal(&mut self) -> f64 {
        self.normal()
    }

    fn discard(&mut self, n: u64) {
        self.counter = self.counter.wrapping_add(n.wrapping_mul(2));
    }
}

/// Adapts any `rand` generator into a [`NormalSource`].
///
/// Discarding draws is linear in the number skipped; prefer [`CounterRng`]
/// when workers need large offsets.
#[derive(Debug, Clone)]
pub struct RngNormalStream<R> {
    rng: R,
}

impl<R: Rng> RngNormalStream<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> NormalSource for RngNormalStream<R> {
    fn next_normal(&mut self) -> f64 {
        get_normal_draw(&mut self.rng)
    }
}

/// RNG factory for reproducible parallel simulations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngFactory {
    base_seed: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    pub fn seed(&self) -> u64 {
        self.base_seed
    }

    /// A stream positioned at the start of the sequence
    pub fn fresh_stream(&self) -> CounterRng {
        CounterRng::new(self.base_seed, 0)
    }

    /// A fresh stream with the first `offset` normal draws discarded
    pub fn substream(&self, offset: u64) -> CounterRng {
        let mut stream = self.fresh_stream();
        stream.discard(offset);
        stream
    }

    /// A standard RNG wrapped as a normal stream, for single-threaded use
    pub fn create_std_stream(&self) -> RngNormalStream<StdRng> {
        RngNormalStream::new(seed_rng_from_u64(self.base_seed))
    }
}

impl Default for RngFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

pub fn seed_rng_from_u64(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_rng_reproducibility() {
        let factory = RngFactory::new(42);

        let mut rng1 = factory.fresh_stream();
        let mut rng2 = factory.fresh_stream();

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut rng1 = RngFactory::new(42).fresh_stream();
        let mut rng2 = RngFactory::new(43).fresh_stream();

        let vals1: Vec<u64> = (0..10).map(|_| rng1.next_u64()).collect();
        let vals2: Vec<u64> = (0..10).map(|_| rng2.next_u64()).collect();

        assert_ne!(vals1, vals2);
    }

    #[test]
    fn test_discard_matches_drawing() {
        let factory = RngFactory::new(7);
        let mut drawn = factory.fresh_stream();
        for _ in 0..1_000 {
            drawn.next_normal();
        }
        let mut skipped = factory.substream(1_000);

        assert_eq!(drawn.position(), skipped.position());
        for _ in 0..50 {
            assert_eq!(drawn.next_normal().to_bits(), skipped.next_normal().to_bits());
        }
    }

    #[test]
    fn test_default_discard_for_rng_stream() {
        let mut a = RngNormalStream::new(seed_rng_from_u64(9));
        let mut b = RngNormalStream::new(seed_rng_from_u64(9));
        for _ in 0..25 {
            a.next_normal();
        }
        b.discard(25);
        assert_eq!(a.next_normal().to_bits(), b.next_normal().to_bits());
    }

    #[test]
    fn test_normal_distribution() {
        let mut rng = RngFactory::new(42).fresh_stream();

        let mut samples = vec![0.0; 100_000];
        rng.fill_normal(&mut samples);

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        assert!(mean.abs() < 0.02, "Mean should be close to 0, got {}", mean);
        assert!(
            (variance - 1.0).abs() < 0.02,
            "Variance should be close to 1, got {}",
            variance
        );
        assert!(samples.iter().all(|z| z.is_finite()));
    }
}
