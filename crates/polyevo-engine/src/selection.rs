//! Parent selection strategies.
//!
//! A [`SelectionStrategy`] turns one generation's fitness vector into parent pairs,
//! identified by their index in the generation. Three strategies are available:
//!
//! - **Tournament** - draw `size` organisms uniformly (with replacement) and keep the
//!   fittest. Larger tournaments mean stronger selection pressure.
//! - **Roulette** - fitness-proportionate draws from an [`AliasSampler`] built once
//!   per generation, so every draw is `O(1)`.
//! - **SUS** (stochastic universal sampling) - one random offset and evenly spaced
//!   pointers over cumulative fitness. Same expectation as roulette with much lower
//!   variance.
//!
//! Elitism is independent of the strategy: [`elite_indices`] picks the organisms that
//! are carried over verbatim before breeding fills the remaining slots.

use rand::{Rng, seq::SliceRandom as _};
use serde::{Deserialize, Serialize};

use crate::{
    alias::{AliasError, AliasSampler},
    params::ConfigError,
    random::RandomSource as _,
};

/// Indices of two parents within the current generation.
pub type ParentPair = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SelectionStrategy {
    Roulette,
    Tournament { size: usize },
    Sus,
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        Self::Tournament { size: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SelectionError {
    #[display("invalid selection input: {_0}")]
    Config(ConfigError),
    #[display("cannot build roulette wheel: {_0}")]
    Alias(AliasError),
}

impl SelectionStrategy {
    /// Selects `fitness.len() / 2` parent pairs.
    ///
    /// The population must be even-sized and non-empty.
    pub fn select_parents<R>(
        &self,
        fitness: &[f64],
        rng: &mut R,
    ) -> Result<Vec<ParentPair>, SelectionError>
    where
        R: Rng + ?Sized,
    {
        let n = fitness.len();
        if n == 0 || n % 2 != 0 {
            return Err(ConfigError::PopulationSize { size: n }.into());
        }
        self.select_pairs(fitness, n / 2, rng)
    }

    /// Selects exactly `pair_count` parent pairs from a non-empty generation.
    pub fn select_pairs<R>(
        &self,
        fitness: &[f64],
        pair_count: usize,
        rng: &mut R,
    ) -> Result<Vec<ParentPair>, SelectionError>
    where
        R: Rng + ?Sized,
    {
        if fitness.is_empty() {
            return Err(ConfigError::PopulationSize { size: 0 }.into());
        }
        let draws = pair_count * 2;
        let parents = match *self {
            Self::Tournament { size } => tournament(fitness, size, draws, rng),
            Self::Roulette => roulette(fitness, draws, rng)?,
            Self::Sus => {
                let mut picks = stochastic_universal(fitness, draws, rng);
                picks.shuffle(rng);
                picks
            }
        };
        Ok(parents
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect())
    }
}

/// One tournament per draw. `size` is clamped to `[2, n]`.
fn tournament<R>(fitness: &[f64], size: usize, draws: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let n = fitness.len();
    let size = size.clamp(2, n.max(2));
    (0..draws)
        .map(|_| {
            let mut winner = rng.uniform_int(n);
            for _ in 1..size {
                let challenger = rng.uniform_int(n);
                if fitness[challenger] > fitness[winner] {
                    winner = challenger;
                }
            }
            winner
        })
        .collect()
}

fn roulette<R>(fitness: &[f64], draws: usize, rng: &mut R) -> Result<Vec<usize>, AliasError>
where
    R: Rng + ?Sized,
{
    let wheel = AliasSampler::new(fitness)?;
    Ok((0..draws).map(|_| wheel.sample(rng)).collect())
}

/// Evenly spaced pointers over cumulative fitness, in index order.
///
/// An all-zero fitness vector degrades to uniform picks.
fn stochastic_universal<R>(fitness: &[f64], draws: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let total: f64 = fitness.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return (0..draws).map(|_| rng.uniform_int(fitness.len())).collect();
    }

    #[expect(clippy::cast_precision_loss)]
    let spacing = total / draws as f64;
    let start = rng.uniform() * spacing;

    let mut picks = Vec::with_capacity(draws);
    let mut index = 0;
    let mut cumulative = fitness[0];
    for k in 0..draws {
        #[expect(clippy::cast_precision_loss)]
        let pointer = start + k as f64 * spacing;
        while pointer >= cumulative && index + 1 < fitness.len() {
            index += 1;
            cumulative += fitness[index];
        }
        picks.push(index);
    }
    picks
}

/// Indices of the `count` fittest organisms, best first. Ties keep the lower index.
#[must_use]
pub fn elite_indices(fitness: &[f64], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));
    order.truncate(count);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random;

    const STRATEGIES: [SelectionStrategy; 3] = [
        SelectionStrategy::Roulette,
        SelectionStrategy::Tournament { size: 3 },
        SelectionStrategy::Sus,
    ];

    fn counts(picks: &[ParentPair], n: usize) -> Vec<usize> {
        let mut counts = vec![0; n];
        for &(a, b) in picks {
            counts[a] += 1;
            counts[b] += 1;
        }
        counts
    }

    #[test]
    fn test_pair_count_is_half_population() {
        let mut rng = random::seeded(1);
        for n in [2, 4, 10, 100] {
            #[expect(clippy::cast_precision_loss)]
            let fitness: Vec<f64> = (0..n).map(|i| i as f64 / n as f64).collect();
            for strategy in STRATEGIES {
                let pairs = strategy.select_parents(&fitness, &mut rng).unwrap();
                assert_eq!(pairs.len(), n / 2, "{strategy:?} with n={n}");
                assert!(pairs.iter().all(|&(a, b)| a < n && b < n));
            }
        }
    }

    #[test]
    fn test_odd_population_is_rejected() {
        let mut rng = random::seeded(2);
        for strategy in STRATEGIES {
            let err = strategy.select_parents(&[0.1, 0.2, 0.3], &mut rng).unwrap_err();
            assert_eq!(
                err,
                SelectionError::Config(ConfigError::PopulationSize { size: 3 })
            );
        }
    }

    #[test]
    fn test_zero_fitness_never_chosen_by_proportionate_strategies() {
        let mut rng = random::seeded(3);
        let fitness = [0.0, 0.5, 0.0, 0.5];
        for strategy in [SelectionStrategy::Roulette, SelectionStrategy::Sus] {
            let pairs = strategy.select_pairs(&fitness, 500, &mut rng).unwrap();
            let c = counts(&pairs, 4);
            assert_eq!(c[0], 0);
            assert_eq!(c[2], 0);
        }
    }

    #[test]
    fn test_sus_is_exact_for_integral_shares() {
        // 4 pointers over shares of 1/4, 1/4, 1/2: every organism gets its exact quota
        let mut rng = random::seeded(4);
        for _ in 0..50 {
            let pairs = SelectionStrategy::Sus
                .select_pairs(&[0.25, 0.25, 0.5], 2, &mut rng)
                .unwrap();
            assert_eq!(counts(&pairs, 3), vec![1, 1, 2]);
        }
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let mut rng = random::seeded(5);
        let fitness = [0.1, 0.2, 0.9, 0.3];
        let pairs = SelectionStrategy::Tournament { size: 4 }
            .select_pairs(&fitness, 1000, &mut rng)
            .unwrap();
        let c = counts(&pairs, 4);
        assert!(c[2] > c[0] + c[1] + c[3]);
    }

    #[test]
    fn test_tournament_size_is_clamped() {
        let mut rng = random::seeded(6);
        let fitness = [0.5, 0.6];
        for size in [0, 1, 2, 50] {
            let pairs = SelectionStrategy::Tournament { size }
                .select_parents(&fitness, &mut rng)
                .unwrap();
            assert_eq!(pairs.len(), 1);
        }
    }

    #[test]
    fn test_all_zero_fitness_still_selects() {
        let mut rng = random::seeded(7);
        for strategy in STRATEGIES {
            let pairs = strategy.select_parents(&[0.0; 6], &mut rng).unwrap();
            assert_eq!(pairs.len(), 3);
        }
    }

    #[test]
    fn test_elite_indices() {
        assert_eq!(elite_indices(&[0.3, 0.9, 0.1, 0.9], 2), vec![1, 3]);
        assert_eq!(elite_indices(&[0.3, 0.9], 0), Vec::<usize>::new());
        assert_eq!(elite_indices(&[0.3, 0.9], 5), vec![1, 0]);
    }

    #[test]
    fn test_strategy_serialization() {
        let json = serde_json::to_string(&SelectionStrategy::Tournament { size: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"tournament","size":3}"#);
        let back: SelectionStrategy = serde_json::from_str(r#"{"type":"sus"}"#).unwrap();
        assert_eq!(back, SelectionStrategy::Sus);
    }
}
