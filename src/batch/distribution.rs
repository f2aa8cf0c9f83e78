//! Parameter distributions for Monte-Carlo sampling
//!
//! A distribution always offers scalar draws. It may also offer a bulk form;
//! when it does not, the sampler falls back to one scalar draw per cell and
//! the resulting table has the same shape and range guarantees.

use crate::Config;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of parameter values in `[low, high]`
pub trait ParamDistribution {
    /// Draw one value in `[low, high]`
    fn draw(&mut self, low: f64, high: f64) -> f64;

    /// Draw `n` values in `[low, high]` at once
    ///
    /// Returns `None` when the distribution has no bulk form.
    fn draw_bulk(&mut self, _low: f64, _high: f64, _n: usize) -> Option<Vec<f64>> {
        None
    }
}

/// Inclusive uniform distribution over a seedable `StdRng`
#[derive(Debug, Clone)]
pub struct UniformDistribution {
    rng: StdRng,
}

impl UniformDistribution {
    /// Seeded when `seed` is given, otherwise from OS entropy
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self { rng }
    }

    /// Uniform distribution using the configured seed
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.seed())
    }
}

impl ParamDistribution for UniformDistribution {
    fn draw(&mut self, low: f64, high: f64) -> f64 {
        self.rng.gen_range(low..=high)
    }

    fn draw_bulk(&mut self, low: f64, high: f64, n: usize) -> Option<Vec<f64>> {
        let uniform = Uniform::new_inclusive(low, high);
        Some(uniform.sample_iter(&mut self.rng).take(n).collect())
    }
}

/// Adapter for plain `FnMut(low, high) -> f64` samplers (scalar only)
///
/// ```rust
/// use por_engine::batch::{FnDistribution, ParamDistribution};
///
/// let mut midpoint = FnDistribution(|low: f64, high: f64| (low + high) / 2.0);
/// assert_eq!(midpoint.draw(0.0, 1.0), 0.5);
/// assert!(midpoint.draw_bulk(0.0, 1.0, 3).is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnDistribution<F>(pub F);

impl<F> ParamDistribution for FnDistribution<F>
where
    F: FnMut(f64, f64) -> f64,
{
    fn draw(&mut self, low: f64, high: f64) -> f64 {
        (self.0)(low, high)
    }
}
