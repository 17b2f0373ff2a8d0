//! Weighted discrete sampling with Vose's alias method.
//!
//! Building the tables is `O(n)`, each draw is `O(1)`. Roulette selection rebuilds
//! one sampler per generation from the fitness vector and then draws every parent
//! from it.

use crate::random::RandomSource;

/// Errors raised while building an [`AliasSampler`].
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum AliasError {
    #[display("cannot build an alias table from an empty weight vector")]
    Empty,
    #[display("weight #{index} is {weight}, weights must be finite and non-negative")]
    InvalidWeight { index: usize, weight: f64 },
}

/// Probability/alias tables for one weight vector (a.k.a. loaded die).
///
/// # Example
///
/// ```
/// use polyevo_engine::{alias::AliasSampler, random};
///
/// let sampler = AliasSampler::new(&[0.0, 0.0, 0.0, 1.0]).unwrap();
/// let mut rng = random::seeded(1);
/// assert!((0..100).all(|_| sampler.sample(&mut rng) == 3));
/// ```
#[derive(Debug, Clone)]
pub struct AliasSampler {
    prob: Vec<f64>,
    alias: Vec<usize>,
}

impl AliasSampler {
    /// Builds the tables for `weights`.
    ///
    /// Weights are rescaled so they average to 1. Entries above 1 donate their
    /// excess to entries below 1 until every column is exactly full. An all-zero
    /// vector is treated as uniform.
    pub fn new(weights: &[f64]) -> Result<Self, AliasError> {
        if weights.is_empty() {
            return Err(AliasError::Empty);
        }
        if let Some((index, &weight)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(AliasError::InvalidWeight { index, weight });
        }

        let n = weights.len();
        let total: f64 = weights.iter().sum();
        #[expect(clippy::cast_precision_loss)]
        let mut prob: Vec<f64> = if total > 0.0 {
            weights.iter().map(|w| w * n as f64 / total).collect()
        } else {
            vec![1.0; n]
        };
        let mut alias: Vec<usize> = (0..n).collect();

        let mut under = vec![];
        let mut over = vec![];
        for (i, &p) in prob.iter().enumerate() {
            if p < 1.0 {
                under.push(i);
            } else if p > 1.0 {
                over.push(i);
            }
            // p == 1.0 is already full and never donates
        }

        while let (Some(&small), Some(&large)) = (under.last(), over.last()) {
            under.pop();
            alias[small] = large;
            prob[large] -= 1.0 - prob[small];
            if prob[large] < 1.0 {
                over.pop();
                under.push(large);
            } else if prob[large] == 1.0 {
                over.pop();
            }
        }

        // Anything left over is only off by floating-point drift; settle it as full.
        for i in under.into_iter().chain(over) {
            prob[i] = 1.0;
            alias[i] = i;
        }

        Ok(Self { prob, alias })
    }

    /// Number of outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prob.len()
    }

    /// Always `false`; construction rejects empty weight vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    /// Draws one index in `0..len()`.
    pub fn sample<R>(&self, rng: &mut R) -> usize
    where
        R: RandomSource + ?Sized,
    {
        let n = self.prob.len();
        #[expect(clippy::cast_precision_loss)]
        let scaled = n as f64 * rng.uniform();
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let i = (scaled.floor() as usize).min(n - 1);
        #[expect(clippy::cast_precision_loss)]
        let y = scaled - i as f64;
        if y < self.prob[i] { i } else { self.alias[i] }
    }
}
