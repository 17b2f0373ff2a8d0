//! Run configuration and its validation.
//!
//! [`EvolutionParams`] gathers every knob of a run. It deserializes from partial
//! JSON (missing fields take their defaults) and is validated once, when a
//! population is created or restored. Invalid configurations are fatal
//! [`ConfigError`]s; nothing is clamped silently at that point.

use serde::{Deserialize, Serialize};

use crate::{
    crossover::CrossoverParams,
    fitness::FitnessParams,
    genome::{GenomeBounds, SizeBounds},
    mutation::{MutationKind, MutationParams},
    selection::SelectionStrategy,
};

/// Hard limits on the points of a single polygon.
pub const POINT_COUNT_LIMITS: SizeBounds = SizeBounds::new(2, 16);

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be even and at least 2, got {size}")]
    PopulationSize { size: usize },
    #[display("genome size bounds must satisfy 1 <= min <= max, got {min}..={max}")]
    GenomeSizeBounds { min: usize, max: usize },
    #[display(
        "point count bounds must satisfy {} <= min <= max <= {}, got {min}..={max}",
        POINT_COUNT_LIMITS.min,
        POINT_COUNT_LIMITS.max
    )]
    PointCountBounds { min: usize, max: usize },
    #[display("elite count must be even and below the population size {population_size}, got {elite_count}")]
    EliteCount {
        elite_count: usize,
        population_size: usize,
    },
    #[display("tournament size must be within 2..={population_size}, got {size}")]
    TournamentSize { size: usize, population_size: usize },
    #[display("{name} must be a probability in [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[display("{name} must be finite and non-negative, got {value}")]
    Sigma { name: &'static str, value: f64 },
}

/// Selection configuration for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionParams {
    pub strategy: SelectionStrategy,
    /// Organisms copied unchanged into the next generation. Must be even.
    pub elite_count: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::default(),
            elite_count: 2,
        }
    }
}

/// Everything that shapes a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionParams {
    pub population_size: usize,
    pub genome_size: SizeBounds,
    pub point_count: SizeBounds,
    pub selection: SelectionParams,
    pub crossover: CrossoverParams,
    pub mutation: MutationParams,
    pub fitness: FitnessParams,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            genome_size: SizeBounds::new(1, 50),
            point_count: SizeBounds::new(3, 6),
            selection: SelectionParams::default(),
            crossover: CrossoverParams::default(),
            mutation: MutationParams::default(),
            fitness: FitnessParams::default(),
        }
    }
}

impl EvolutionParams {
    #[must_use]
    pub fn bounds(&self) -> GenomeBounds {
        GenomeBounds {
            genome_size: self.genome_size,
            point_count: self.point_count,
        }
    }

    /// Checks every constraint on the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.population_size;
        if n < 2 || n % 2 != 0 {
            return Err(ConfigError::PopulationSize { size: n });
        }

        let SizeBounds { min, max } = self.genome_size;
        if min < 1 || min > max {
            return Err(ConfigError::GenomeSizeBounds { min, max });
        }

        let SizeBounds { min, max } = self.point_count;
        if min < POINT_COUNT_LIMITS.min || min > max || max > POINT_COUNT_LIMITS.max {
            return Err(ConfigError::PointCountBounds { min, max });
        }

        let elite_count = self.selection.elite_count;
        if elite_count % 2 != 0 || elite_count >= n {
            return Err(ConfigError::EliteCount {
                elite_count,
                population_size: n,
            });
        }

        if let SelectionStrategy::Tournament { size } = self.selection.strategy
            && !(2..=n).contains(&size)
        {
            return Err(ConfigError::TournamentSize {
                size,
                population_size: n,
            });
        }

        check_probability("crossover probability", self.crossover.probability)?;

        for kind in MutationKind::ALL {
            let ramp = self.mutation.probabilities.get(kind);
            if !ramp.values_are_probabilities() {
                let value = if (0.0..=1.0).contains(&ramp.start_value) {
                    ramp.end_value
                } else {
                    ramp.start_value
                };
                return Err(ConfigError::Probability {
                    name: mutation_name(kind),
                    value,
                });
            }
        }

        check_sigma("point sigma", self.mutation.point_sigma)?;
        check_sigma("color sigma", self.mutation.color_sigma)?;

        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { name, value })
    }
}

fn check_sigma(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Sigma { name, value })
    }
}

fn mutation_name(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::TweakPoint => "tweak-point probability",
        MutationKind::TweakColor => "tweak-color probability",
        MutationKind::AddPoint => "add-point probability",
        MutationKind::RemovePoint => "remove-point probability",
        MutationKind::AddChromosome => "add-chromosome probability",
        MutationKind::RemoveChromosome => "remove-chromosome probability",
        MutationKind::ResetChromosome => "reset-chromosome probability",
        MutationKind::PermuteChromosomes => "permute-chromosomes probability",
    }
}
