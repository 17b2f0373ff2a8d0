//! Mutation of offspring genomes.
//!
//! Every mutation kind is an independent Bernoulli trial, either per point
//! ([`MutationKind::TweakPoint`]), per chromosome ([`MutationKind::TweakColor`]) or
//! once per genome (all structural kinds). Each trial's probability comes from a
//! [`ProbabilityRamp`] evaluated at the run's global best fitness, so mutation
//! pressure anneals uniformly as the whole population converges.
//!
//! Size bounds are hard limits checked before an operation commits: a trial that
//! would add past a cap or remove below a floor is skipped.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    genome::{Chromosome, Genome, GenomeBounds},
    random::RandomSource as _,
};

/// Mutation probability that moves linearly with fitness.
///
/// Below `start_fitness` the probability is `start_value`, above `end_fitness` it is
/// `end_value`, and in between it is interpolated.
///
/// ```
/// use polyevo_engine::mutation::ProbabilityRamp;
///
/// let ramp = ProbabilityRamp::new(0.5, 0.1, 0.0, 0.8);
/// assert_eq!(ramp.at(0.0), 0.5);
/// assert!((ramp.at(0.4) - 0.3).abs() < 1e-12);
/// assert_eq!(ramp.at(0.95), 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityRamp {
    pub start_value: f64,
    pub end_value: f64,
    pub start_fitness: f64,
    pub end_fitness: f64,
}

impl ProbabilityRamp {
    #[must_use]
    pub const fn new(start_value: f64, end_value: f64, start_fitness: f64, end_fitness: f64) -> Self {
        Self {
            start_value,
            end_value,
            start_fitness,
            end_fitness,
        }
    }

    /// Same probability at every fitness.
    #[must_use]
    pub const fn constant(p: f64) -> Self {
        Self::new(p, p, 0.0, 1.0)
    }

    /// Probability at fitness `f`.
    #[must_use]
    pub fn at(&self, f: f64) -> f64 {
        let span = self.end_fitness - self.start_fitness;
        let t = if span > 0.0 {
            ((f - self.start_fitness) / span).clamp(0.0, 1.0)
        } else if f >= self.end_fitness {
            1.0
        } else {
            0.0
        };
        self.start_value + (self.end_value - self.start_value) * t
    }

    pub(crate) fn values_are_probabilities(&self) -> bool {
        [self.start_value, self.end_value]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
            && self.start_fitness.is_finite()
            && self.end_fitness.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    TweakPoint,
    TweakColor,
    AddPoint,
    RemovePoint,
    AddChromosome,
    RemoveChromosome,
    ResetChromosome,
    PermuteChromosomes,
}

impl MutationKind {
    pub const ALL: [Self; 8] = [
        Self::TweakPoint,
        Self::TweakColor,
        Self::AddPoint,
        Self::RemovePoint,
        Self::AddChromosome,
        Self::RemoveChromosome,
        Self::ResetChromosome,
        Self::PermuteChromosomes,
    ];
}

/// One probability ramp per mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationProbabilities {
    pub tweak_point: ProbabilityRamp,
    pub tweak_color: ProbabilityRamp,
    pub add_point: ProbabilityRamp,
    pub remove_point: ProbabilityRamp,
    pub add_chromosome: ProbabilityRamp,
    pub remove_chromosome: ProbabilityRamp,
    pub reset_chromosome: ProbabilityRamp,
    pub permute_chromosomes: ProbabilityRamp,
}

impl MutationProbabilities {
    /// Every kind disabled.
    #[must_use]
    pub const fn none() -> Self {
        let off = ProbabilityRamp::constant(0.0);
        Self {
            tweak_point: off,
            tweak_color: off,
            add_point: off,
            remove_point: off,
            add_chromosome: off,
            remove_chromosome: off,
            reset_chromosome: off,
            permute_chromosomes: off,
        }
    }

    #[must_use]
    pub fn get(&self, kind: MutationKind) -> &ProbabilityRamp {
        match kind {
            MutationKind::TweakPoint => &self.tweak_point,
            MutationKind::TweakColor => &self.tweak_color,
            MutationKind::AddPoint => &self.add_point,
            MutationKind::RemovePoint => &self.remove_point,
            MutationKind::AddChromosome => &self.add_chromosome,
            MutationKind::RemoveChromosome => &self.remove_chromosome,
            MutationKind::ResetChromosome => &self.reset_chromosome,
            MutationKind::PermuteChromosomes => &self.permute_chromosomes,
        }
    }

    pub fn get_mut(&mut self, kind: MutationKind) -> &mut ProbabilityRamp {
        match kind {
            MutationKind::TweakPoint => &mut self.tweak_point,
            MutationKind::TweakColor => &mut self.tweak_color,
            MutationKind::AddPoint => &mut self.add_point,
            MutationKind::RemovePoint => &mut self.remove_point,
            MutationKind::AddChromosome => &mut self.add_chromosome,
            MutationKind::RemoveChromosome => &mut self.remove_chromosome,
            MutationKind::ResetChromosome => &mut self.reset_chromosome,
            MutationKind::PermuteChromosomes => &mut self.permute_chromosomes,
        }
    }
}

impl Default for MutationProbabilities {
    fn default() -> Self {
        Self {
            tweak_point: ProbabilityRamp::new(0.05, 0.01, 0.0, 0.98),
            tweak_color: ProbabilityRamp::new(0.05, 0.01, 0.0, 0.98),
            add_point: ProbabilityRamp::constant(0.01),
            remove_point: ProbabilityRamp::constant(0.01),
            add_chromosome: ProbabilityRamp::new(0.02, 0.005, 0.0, 0.98),
            remove_chromosome: ProbabilityRamp::constant(0.005),
            reset_chromosome: ProbabilityRamp::new(0.01, 0.001, 0.0, 0.98),
            permute_chromosomes: ProbabilityRamp::constant(0.01),
        }
    }
}

/// Mutation configuration for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationParams {
    pub probabilities: MutationProbabilities,
    /// Standard deviation of point noise, in canvas units.
    pub point_sigma: f64,
    /// Standard deviation of color noise, in channel units.
    pub color_sigma: f64,
}

impl Default for MutationParams {
    fn default() -> Self {
        Self {
            probabilities: MutationProbabilities::default(),
            point_sigma: 0.05,
            color_sigma: 0.05,
        }
    }
}

/// Probabilities resolved for one fitness level.
#[derive(Debug, Clone, Copy)]
struct Rates {
    tweak_point: f64,
    tweak_color: f64,
    add_point: f64,
    remove_point: f64,
    add_chromosome: f64,
    remove_chromosome: f64,
    reset_chromosome: f64,
    permute_chromosomes: f64,
}

impl Rates {
    fn at(probabilities: &MutationProbabilities, fitness: f64) -> Self {
        Self {
            tweak_point: probabilities.tweak_point.at(fitness),
            tweak_color: probabilities.tweak_color.at(fitness),
            add_point: probabilities.add_point.at(fitness),
            remove_point: probabilities.remove_point.at(fitness),
            add_chromosome: probabilities.add_chromosome.at(fitness),
            remove_chromosome: probabilities.remove_chromosome.at(fitness),
            reset_chromosome: probabilities.reset_chromosome.at(fitness),
            permute_chromosomes: probabilities.permute_chromosomes.at(fitness),
        }
    }
}

impl MutationParams {
    /// Mutates `genome` in place. `best_fitness` is the run's global best and drives
    /// every ramp.
    ///
    /// Returns the number of mutations that were applied.
    pub fn mutate<R>(
        &self,
        genome: &mut Genome,
        bounds: &GenomeBounds,
        best_fitness: f64,
        rng: &mut R,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        let rates = Rates::at(&self.probabilities, best_fitness);
        let mut applied = 0;

        for chromosome in genome.chromosomes_mut().iter_mut() {
            for point in chromosome.points_mut() {
                if rng.chance(rates.tweak_point) {
                    point.tweak(self.point_sigma, rng);
                    applied += 1;
                }
            }
            if rng.chance(rates.tweak_color) {
                chromosome.color_mut().tweak(self.color_sigma, rng);
                applied += 1;
            }
        }

        let chromosomes = genome.chromosomes_mut();

        if rng.chance(rates.add_point) && !chromosomes.is_empty() {
            let i = rng.uniform_int(chromosomes.len());
            if chromosomes[i].insert_random_point(bounds.point_count, rng) {
                applied += 1;
            }
        }

        if rng.chance(rates.remove_point) && !chromosomes.is_empty() {
            let i = rng.uniform_int(chromosomes.len());
            if chromosomes[i].remove_random_point(bounds.point_count, rng) {
                applied += 1;
            }
        }

        if rng.chance(rates.add_chromosome) && chromosomes.len() < bounds.genome_size.max {
            chromosomes.push(Chromosome::random(bounds.point_count, rng));
            applied += 1;
        }

        if rng.chance(rates.remove_chromosome)
            && chromosomes.len() > bounds.genome_size.min
            && !chromosomes.is_empty()
        {
            let i = rng.uniform_int(chromosomes.len());
            chromosomes.remove(i);
            applied += 1;
        }

        if rng.chance(rates.reset_chromosome) && !chromosomes.is_empty() {
            let i = rng.uniform_int(chromosomes.len());
            chromosomes[i] = Chromosome::random(bounds.point_count, rng);
            applied += 1;
        }

        if rng.chance(rates.permute_chromosomes) && chromosomes.len() >= 2 {
            let i = rng.uniform_int(chromosomes.len());
            let j = rng.uniform_int(chromosomes.len());
            chromosomes.swap(i, j);
            applied += 1;
        }

        applied
    }
}
