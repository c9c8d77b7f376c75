//! Source of randomness consumed by the simulation.

use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Binomial;
use std::collections::VecDeque;

/// Random draws needed by the simulator and the prior generators.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Uniform integer in `low..=high`.
    fn uniform_int(&mut self, low: usize, high: usize) -> usize;

    /// Number of successes in `n` Bernoulli trials of probability `p`.
    fn binomial(&mut self, n: u64, p: f64) -> Result<u64>;

    /// Uniform in-place permutation (Fisher-Yates).
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.uniform_int(0, i);
            items.swap(i, j);
        }
    }
}

/// [`RandomSource`] backed by a `rand` generator.
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<ChaCha12Rng> {
    /// Deterministic source for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha12Rng::seed_from_u64(seed))
    }

    /// Source seeded from operating system entropy.
    pub fn from_os_rng() -> Result<Self> {
        let rng = ChaCha12Rng::try_from_os_rng().context("failed to seed rng from os")?;
        Ok(Self::new(rng))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn uniform_int(&mut self, low: usize, high: usize) -> usize {
        self.rng.random_range(low..=high)
    }

    fn binomial(&mut self, n: u64, p: f64) -> Result<u64> {
        let dist = Binomial::new(n, p)
            .with_context(|| format!("invalid binomial parameters n = {n}, p = {p}"))?;
        Ok(dist.sample(&mut self.rng))
    }
}

/// Fixed-sequence [`RandomSource`] for deterministic tests.
///
/// Uniform draws cycle through the scripted values, integer draws always
/// return the upper bound (so shuffles keep the original order) and
/// binomial draws are popped from a queue.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    uniforms: Vec<f64>,
    i_next: usize,
    binomials: VecDeque<u64>,
}

impl ScriptedSource {
    pub fn new(uniforms: Vec<f64>) -> Self {
        assert!(!uniforms.is_empty(), "scripted source needs uniform draws");
        Self {
            uniforms,
            i_next: 0,
            binomials: VecDeque::new(),
        }
    }

    /// Source whose uniform draws always return `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    pub fn with_binomials(mut self, binomials: Vec<u64>) -> Self {
        self.binomials = binomials.into();
        self
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self) -> f64 {
        let value = self.uniforms[self.i_next % self.uniforms.len()];
        self.i_next += 1;
        value
    }

    fn uniform_int(&mut self, _low: usize, high: usize) -> usize {
        high
    }

    fn binomial(&mut self, n: u64, _p: f64) -> Result<u64> {
        match self.binomials.pop_front() {
            Some(draw) if draw <= n => Ok(draw),
            Some(draw) => bail!("scripted binomial draw {draw} exceeds n = {n}"),
            None => bail!("no scripted binomial draws left"),
        }
    }
}
