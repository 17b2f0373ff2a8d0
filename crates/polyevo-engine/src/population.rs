//! The generational state machine.
//!
//! A [`Population`] owns one generation of organisms, the target image, the run
//! configuration and a seeded generator. [`Population::step`] performs one complete
//! generational transition:
//!
//! 1. **Evaluate** - score every organism without a cached fitness
//! 2. **Summarize** - compute [`GenerationStats`] and update the global best
//!    (only a strictly higher fitness counts as an improvement)
//! 3. **Elitism** - clone the top `elite_count` organisms under fresh ids
//! 4. **Selection** - pick parent pairs for the remaining slots
//! 5. **Crossover + mutation** - breed two children per pair; mutation rates follow
//!    the global best fitness
//! 6. **Replace** - the offspring become the current generation and `gen_id` advances
//!
//! The engine has no notion of "done" and no internal suspension points. Stop
//! criteria, pausing and persistence belong to whoever calls `step`.
//!
//! # Example
//!
//! ```
//! use polyevo_engine::{EvolutionParams, Genome, PixelBuffer, Population};
//!
//! let target = PixelBuffer::filled(4, 4, [255, 0, 0, 255]).unwrap();
//! let params = EvolutionParams {
//!     population_size: 10,
//!     ..EvolutionParams::default()
//! };
//! let mut population = Population::create(params, target, 42).unwrap();
//!
//! // Any `Fn(&Genome, u32, u32) -> PixelBuffer` is a rasterizer
//! let rasterizer =
//!     |_: &Genome, w: u32, h: u32| PixelBuffer::filled(w, h, [255, 255, 255, 255]).unwrap();
//! let stats = population.step(&rasterizer).unwrap();
//! assert_eq!(stats.gen_id, 0);
//! assert_eq!(population.gen_id(), 1);
//! ```

use std::collections::HashSet;

use crate::{
    fitness::{FitnessError, FitnessEvaluator},
    genome::Genome,
    organism::{Organism, OrganismId, OrganismRecord},
    params::{ConfigError, EvolutionParams},
    random::{self, EvoRng},
    raster::{PixelBuffer, Rasterizer},
    selection::{self, SelectionError},
    snapshot::{BestRecord, RestoreError, Snapshot, TargetSize},
    stats::{FitnessSummary, GenerationStats},
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum StepError {
    #[display("fitness evaluation failed: {_0}")]
    Fitness(FitnessError),
    #[display("parent selection failed: {_0}")]
    Selection(SelectionError),
}

/// Best organism seen so far and the generation it came from.
#[derive(Debug, Clone)]
pub struct BestOrganism {
    pub organism: Organism,
    pub gen_id: u64,
}

impl BestOrganism {
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.organism.fitness().unwrap_or(0.0)
    }
}

/// One generation of organisms plus everything needed to produce the next.
#[derive(Debug)]
pub struct Population {
    params: EvolutionParams,
    target: PixelBuffer,
    evaluator: FitnessEvaluator,
    organisms: Vec<Organism>,
    gen_id: u64,
    next_id: u64,
    best: Option<BestOrganism>,
    rng: EvoRng,
}

impl Population {
    /// Creates generation 0 with random genomes. Nothing is evaluated yet.
    pub fn create(
        params: EvolutionParams,
        target: PixelBuffer,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        let mut rng = random::seeded(seed);
        let bounds = params.bounds();
        let organisms = (0..params.population_size)
            .map(|i| Organism::new(OrganismId(i as u64), Genome::random(&bounds, &mut rng)))
            .collect();
        Ok(Self {
            evaluator: FitnessEvaluator::new(params.fitness),
            next_id: params.population_size as u64,
            params,
            target,
            organisms,
            gen_id: 0,
            best: None,
            rng,
        })
    }

    /// Rebuilds a population from a snapshot.
    ///
    /// The snapshot must match the configuration and target exactly; genomes are
    /// never truncated or padded to fit.
    pub fn restore(
        snapshot: Snapshot,
        params: EvolutionParams,
        target: PixelBuffer,
        seed: u64,
    ) -> Result<Self, RestoreError> {
        params.validate()?;

        let current = target_size(&target);
        if snapshot.target != current {
            return Err(RestoreError::TargetMismatch {
                snapshot: snapshot.target,
                current,
            });
        }
        if snapshot.organisms.len() != params.population_size {
            return Err(RestoreError::OrganismCount {
                expected: params.population_size,
                actual: snapshot.organisms.len(),
            });
        }

        let mut seen = HashSet::new();
        for record in &snapshot.organisms {
            if !seen.insert(record.id) {
                return Err(RestoreError::DuplicateId { id: record.id });
            }
            check_record(record.id, &record.genome, record.fitness, &params)?;
        }
        if let Some(best) = &snapshot.best {
            check_record(best.id, &best.genome, Some(best.fitness), &params)?;
        }

        let next_id = snapshot
            .organisms
            .iter()
            .map(|r| r.id)
            .chain(snapshot.best.as_ref().map(|b| b.id))
            .max()
            .map_or(0, |OrganismId(id)| id + 1);

        let best = snapshot.best.map(|b| BestOrganism {
            organism: Organism::with_fitness(b.id, b.genome, Some(b.fitness)),
            gen_id: b.gen_id,
        });

        Ok(Self {
            evaluator: FitnessEvaluator::new(params.fitness),
            params,
            target,
            organisms: snapshot.organisms.into_iter().map(Organism::from).collect(),
            gen_id: snapshot.gen_id,
            next_id,
            best,
            rng: random::seeded(seed),
        })
    }

    /// Describes the current generation completely enough for [`Self::restore`].
    #[must_use]
    pub fn serialize(&self) -> Snapshot {
        Snapshot {
            gen_id: self.gen_id,
            target: target_size(&self.target),
            organisms: self.organisms.iter().map(OrganismRecord::from).collect(),
            best: self.best.as_ref().map(|b| BestRecord {
                id: b.organism.id(),
                genome: b.organism.genome().clone(),
                fitness: b.fitness(),
                gen_id: b.gen_id,
            }),
        }
    }

    #[must_use]
    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    #[must_use]
    pub fn target(&self) -> &PixelBuffer {
        &self.target
    }

    /// Generation the current organisms belong to.
    #[must_use]
    pub fn gen_id(&self) -> u64 {
        self.gen_id
    }

    #[must_use]
    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    /// Best organism of the run so far, `None` before the first step.
    #[must_use]
    pub fn best(&self) -> Option<&BestOrganism> {
        self.best.as_ref()
    }

    /// Runs one generation and returns the statistics of the generation that was
    /// just evaluated (the one being replaced).
    ///
    /// On error nothing is recorded: the population stays at the current generation
    /// and organisms that were waiting for a score stay unscored, even if some of
    /// them were rendered before the failure.
    pub fn step<R>(&mut self, rasterizer: &R) -> Result<GenerationStats, StepError>
    where
        R: Rasterizer + Sync + ?Sized,
    {
        let fresh = self.evaluate_pending(rasterizer)?;

        // every organism is scored at this point
        let fitness: Vec<f64> = self
            .organisms
            .iter()
            .map(|o| o.fitness().unwrap_or(0.0))
            .collect();
        let summary = FitnessSummary::new(&fitness)
            .unwrap_or_else(|| unreachable!("population size is validated to be at least 2"));

        let best_index = summary.best_index;
        if let Some((_, phenotype)) = fresh.into_iter().find(|(i, _)| *i == best_index) {
            self.organisms[best_index].set_phenotype(Some(phenotype));
        }
        let generation_best = self.organisms[best_index].clone();

        let improved = self
            .best
            .as_ref()
            .is_none_or(|best| summary.max > best.fitness());
        if improved {
            self.best = Some(BestOrganism {
                organism: generation_best.clone(),
                gen_id: self.gen_id,
            });
        }
        let global_best_fitness = self.best.as_ref().map_or(summary.max, BestOrganism::fitness);

        let stats = GenerationStats {
            gen_id: self.gen_id,
            max_fitness: summary.max,
            mean_fitness: summary.mean,
            min_fitness: summary.min,
            std_dev: summary.std_dev,
            improved,
            best: generation_best,
            global_best_fitness,
        };

        self.organisms = self.breed(&fitness, global_best_fitness)?;
        self.gen_id += 1;

        Ok(stats)
    }

    /// Scores organisms lacking a fitness. Returns the fresh phenotypes by index so
    /// the caller can keep the ones worth keeping.
    fn evaluate_pending<R>(
        &mut self,
        rasterizer: &R,
    ) -> Result<Vec<(usize, PixelBuffer)>, FitnessError>
    where
        R: Rasterizer + Sync + ?Sized,
    {
        let pending: Vec<usize> = (0..self.organisms.len())
            .filter(|&i| self.organisms[i].fitness().is_none())
            .collect();
        let genomes: Vec<&Genome> = pending
            .iter()
            .map(|&i| self.organisms[i].genome())
            .collect();
        let evaluations = self
            .evaluator
            .evaluate_all(&genomes, &self.target, rasterizer)?;

        Ok(pending
            .into_iter()
            .zip(evaluations)
            .map(|(i, evaluation)| {
                self.organisms[i].set_evaluation(evaluation.fitness, None);
                (i, evaluation.phenotype)
            })
            .collect())
    }

    /// Builds the next generation from the scored current one.
    fn breed(&mut self, fitness: &[f64], best_fitness: f64) -> Result<Vec<Organism>, StepError> {
        let n = self.params.population_size;
        let elite_count = self.params.selection.elite_count;
        let bounds = self.params.bounds();

        let mut next = Vec::with_capacity(n);
        for i in selection::elite_indices(fitness, elite_count) {
            let id = self.allocate_id();
            next.push(self.organisms[i].clone_as(id));
        }

        let pairs = self
            .params
            .selection
            .strategy
            .select_pairs(fitness, (n - next.len()) / 2, &mut self.rng)?;

        let crossover = self.params.crossover;
        let mutation = self.params.mutation;
        for (a, b) in pairs {
            let (mut x, mut y) = crossover.kind.cross(
                self.organisms[a].genome(),
                self.organisms[b].genome(),
                crossover.probability,
                &mut self.rng,
            );
            for child in [&mut x, &mut y] {
                mutation.mutate(child, &bounds, best_fitness, &mut self.rng);
            }
            for genome in [x, y] {
                let id = self.allocate_id();
                next.push(Organism::new(id, genome));
            }
        }

        debug_assert_eq!(next.len(), n);
        Ok(next)
    }

    fn allocate_id(&mut self) -> OrganismId {
        let id = OrganismId(self.next_id);
        self.next_id += 1;
        id
    }
}

fn target_size(target: &PixelBuffer) -> TargetSize {
    TargetSize {
        width: target.width(),
        height: target.height(),
    }
}

fn check_record(
    id: OrganismId,
    genome: &Genome,
    fitness: Option<f64>,
    params: &EvolutionParams,
) -> Result<(), RestoreError> {
    if let Some(reason) = genome.bounds_violation(&params.bounds()) {
        return Err(RestoreError::InvalidGenome { id, reason });
    }
    if let Some(fitness) = fitness
        && !(0.0..=1.0).contains(&fitness)
    {
        return Err(RestoreError::InvalidFitness { id, fitness });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        crossover::{CrossoverKind, CrossoverParams},
        genome::SizeBounds,
        params::SelectionParams,
        selection::SelectionStrategy,
    };

    fn params() -> EvolutionParams {
        EvolutionParams {
            population_size: 8,
            genome_size: SizeBounds::new(1, 5),
            point_count: SizeBounds::new(3, 5),
            selection: SelectionParams {
                strategy: SelectionStrategy::Tournament { size: 2 },
                elite_count: 2,
            },
            crossover: CrossoverParams {
                kind: CrossoverKind::OnePoint,
                probability: 0.9,
            },
            ..EvolutionParams::default()
        }
    }

    fn target() -> PixelBuffer {
        PixelBuffer::filled(4, 4, [255, 0, 0, 255]).unwrap()
    }

    /// Scores genomes by size: more chromosomes render redder.
    fn by_size(genome: &Genome, w: u32, h: u32) -> PixelBuffer {
        #[expect(clippy::cast_possible_truncation)]
        let red = (genome.len() * 50).min(255) as u8;
        PixelBuffer::filled(w, h, [red, 0, 0, 255]).unwrap()
    }

    #[test]
    fn test_create_is_unevaluated() {
        let population = Population::create(params(), target(), 1).unwrap();
        assert_eq!(population.gen_id(), 0);
        assert_eq!(population.organisms().len(), 8);
        assert!(population.organisms().iter().all(|o| o.fitness().is_none()));
        assert!(population.best().is_none());
        let ids: Vec<u64> = population.organisms().iter().map(|o| o.id().0).collect();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_create_rejects_bad_config() {
        let bad = EvolutionParams {
            population_size: 7,
            ..params()
        };
        assert_eq!(
            Population::create(bad, target(), 1).unwrap_err(),
            ConfigError::PopulationSize { size: 7 }
        );
    }

    #[test]
    fn test_step_advances_generation() {
        let mut population = Population::create(params(), target(), 2).unwrap();
        let stats = population.step(&by_size).unwrap();
        assert_eq!(stats.gen_id, 0);
        assert!(stats.improved);
        assert!(stats.min_fitness <= stats.mean_fitness && stats.mean_fitness <= stats.max_fitness);
        assert_eq!(stats.best.fitness(), Some(stats.max_fitness));
        assert!(stats.best.phenotype().is_some());
        assert_eq!(population.gen_id(), 1);
        assert_eq!(population.best().unwrap().gen_id, 0);

        // Only the elites come with a fitness
        let scored = population
            .organisms()
            .iter()
            .filter(|o| o.fitness().is_some())
            .count();
        assert_eq!(scored, 2);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut population = Population::create(params(), target(), 3).unwrap();
        let mut last = 7;
        for _ in 0..5 {
            population.step(&by_size).unwrap();
            for organism in population.organisms() {
                assert!(organism.id().0 > last);
            }
            last = population.organisms().iter().map(|o| o.id().0).max().unwrap();
        }
    }

    #[test]
    fn test_plateau_is_not_an_improvement() {
        let params = EvolutionParams {
            mutation: crate::mutation::MutationParams {
                probabilities: crate::mutation::MutationProbabilities::none(),
                ..Default::default()
            },
            ..params()
        };
        let flat = |_: &Genome, w: u32, h: u32| PixelBuffer::filled(w, h, [0, 0, 0, 255]).unwrap();
        let mut population = Population::create(params, target(), 4).unwrap();
        assert!(population.step(&flat).unwrap().improved);
        for _ in 0..5 {
            assert!(!population.step(&flat).unwrap().improved);
        }
    }

    #[test]
    fn test_rasterizer_failure_fails_step() {
        let mut population = Population::create(params(), target(), 5).unwrap();
        let wrong = |_: &Genome, _: u32, _: u32| PixelBuffer::filled(2, 2, [0, 0, 0, 255]).unwrap();
        let err = population.step(&wrong).unwrap_err();
        assert!(matches!(err, StepError::Fitness(FitnessError::DimensionMismatch { .. })));
        assert_eq!(population.gen_id(), 0);
    }

    #[test]
    fn test_failed_step_records_no_fitness() {
        let mut population = Population::create(params(), target(), 5).unwrap();
        let (width, height) = population.target().dimensions();
        let calls = AtomicUsize::new(0);
        // only the last render has the wrong size
        let last = population.organisms().len() - 1;
        let flaky = |_: &Genome, _: u32, _: u32| {
            if calls.fetch_add(1, Ordering::SeqCst) == last {
                PixelBuffer::filled(width + 1, height, [0, 0, 0, 255]).unwrap()
            } else {
                PixelBuffer::filled(width, height, [0, 0, 0, 255]).unwrap()
            }
        };
        assert!(population.step(&flaky).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), last + 1);
        assert_eq!(population.gen_id(), 0);
        assert!(population.organisms().iter().all(|o| o.fitness().is_none()));
        assert!(population.best().is_none());

        // a later successful step scores everyone
        population.step(&by_size).unwrap();
        assert_eq!(population.gen_id(), 1);
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut population = Population::create(params(), target(), 6).unwrap();
        for _ in 0..3 {
            population.step(&by_size).unwrap();
        }
        let snapshot = population.serialize();
        let restored = Population::restore(snapshot.clone(), params(), target(), 99).unwrap();
        assert_eq!(restored.serialize(), snapshot);
        assert_eq!(restored.gen_id(), 3);
    }

    #[test]
    fn test_restored_population_keeps_going() {
        let mut population = Population::create(params(), target(), 7).unwrap();
        population.step(&by_size).unwrap();
        let mut restored =
            Population::restore(population.serialize(), params(), target(), 8).unwrap();
        let max_id = restored.organisms().iter().map(|o| o.id().0).max().unwrap();
        let stats = restored.step(&by_size).unwrap();
        assert_eq!(stats.gen_id, 1);
        assert!(restored.organisms().iter().all(|o| o.id().0 > max_id));
    }

    mod restore_errors {
        use super::*;

        fn snapshot() -> Snapshot {
            let mut population = Population::create(params(), target(), 10).unwrap();
            population.step(&by_size).unwrap();
            population.serialize()
        }

        #[test]
        fn test_target_mismatch() {
            let other = PixelBuffer::filled(8, 8, [0, 0, 0, 255]).unwrap();
            assert!(matches!(
                Population::restore(snapshot(), params(), other, 1),
                Err(RestoreError::TargetMismatch { .. })
            ));
        }

        #[test]
        fn test_population_size_mismatch() {
            let bigger = EvolutionParams {
                population_size: 10,
                ..params()
            };
            assert!(matches!(
                Population::restore(snapshot(), bigger, target(), 1),
                Err(RestoreError::OrganismCount {
                    expected: 10,
                    actual: 8
                })
            ));
        }

        #[test]
        fn test_genome_outside_bounds() {
            let tighter = EvolutionParams {
                genome_size: SizeBounds::new(1, 1),
                ..params()
            };
            let mut snapshot = snapshot();
            // make sure at least one genome is too long for the tighter bounds
            let donor = snapshot.organisms[0].genome.chromosomes()[0].clone();
            snapshot.organisms[0].genome = Genome::new(vec![donor.clone(), donor]);
            assert!(matches!(
                Population::restore(snapshot, tighter, target(), 1),
                Err(RestoreError::InvalidGenome { .. })
            ));
        }

        #[test]
        fn test_bad_fitness_and_duplicates() {
            let mut bad_fitness = snapshot();
            bad_fitness.organisms[3].fitness = Some(1.5);
            assert!(matches!(
                Population::restore(bad_fitness, params(), target(), 1),
                Err(RestoreError::InvalidFitness { .. })
            ));

            let mut duplicate = snapshot();
            duplicate.organisms[1].id = duplicate.organisms[0].id;
            assert!(matches!(
                Population::restore(duplicate, params(), target(), 1),
                Err(RestoreError::DuplicateId { .. })
            ));
        }

        #[test]
        fn test_invalid_config() {
            let bad = EvolutionParams {
                population_size: 9,
                ..params()
            };
            assert!(matches!(
                Population::restore(snapshot(), bad, target(), 1),
                Err(RestoreError::Config(ConfigError::PopulationSize { size: 9 }))
            ));
        }
    }
}
