//! Random number sources used by every genetic operator.
//!
//! All operators take a generic `R: Rng + ?Sized`, so any `rand` generator works.
//! [`RandomSource`] adds the three draws the engine actually needs on top of `Rng`,
//! and [`EvoRng`] is the seeded generator a [`Population`](crate::Population) owns.

use rand::{Rng, SeedableRng as _};
use rand_distr::StandardNormal;
use rand_pcg::Pcg64;

/// Seeded generator owned by a population.
///
/// PCG is small, fast and fully determined by its seed, which keeps
/// selection, crossover and mutation reproducible across runs.
pub type EvoRng = Pcg64;

/// Creates an [`EvoRng`] from a 64-bit seed.
///
/// # Example
///
/// ```
/// use polyevo_engine::random::{self, RandomSource as _};
///
/// let mut a = random::seeded(7);
/// let mut b = random::seeded(7);
/// assert_eq!(a.uniform(), b.uniform());
/// ```
#[must_use]
pub fn seeded(seed: u64) -> EvoRng {
    Pcg64::seed_from_u64(seed)
}

/// Uniform and Gaussian draws on top of [`Rng`].
///
/// Gaussian values are not clamped; keeping genes in range is the caller's job.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Uniform integer in `0..n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    fn uniform_int(&mut self, n: usize) -> usize;

    /// Normally distributed value with mean `mu` and standard deviation `sigma`.
    fn gaussian(&mut self, mu: f64, sigma: f64) -> f64;

    /// Returns `true` with probability `p` (values outside `[0, 1]` saturate).
    fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.uniform() < p
        }
    }
}

impl<R> RandomSource for R
where
    R: Rng + ?Sized,
{
    fn uniform(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn uniform_int(&mut self, n: usize) -> usize {
        assert!(n > 0, "uniform_int requires a non-empty range");
        self.random_range(0..n)
    }

    fn gaussian(&mut self, mu: f64, sigma: f64) -> f64 {
        let z: f64 = self.sample(StandardNormal);
        mu + sigma * z
    }
}
