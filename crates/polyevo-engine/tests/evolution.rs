//! End-to-end runs of the generation loop against a small solid target.

use polyevo_engine::{
    EvolutionParams, Genome, PixelBuffer, Population, RestoreError, SelectionParams, SizeBounds,
    crossover::{CrossoverKind, CrossoverParams},
    selection::SelectionStrategy,
};

const RED: [u8; 4] = [255, 0, 0, 255];

/// Ignores geometry and blends every chromosome's color over white across the
/// whole canvas. Cheap, deterministic and still rewards red, opaque polygons.
fn flat_fill(genome: &Genome, width: u32, height: u32) -> PixelBuffer {
    let mut rgb = [1.0_f64; 3];
    for chromosome in genome.chromosomes() {
        let color = chromosome.color();
        for (channel, value) in rgb.iter_mut().zip([color.r, color.g, color.b]) {
            *channel = value * color.a + *channel * (1.0 - color.a);
        }
    }
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
    PixelBuffer::filled(width, height, [r, g, b, 255]).unwrap()
}

fn params(selection: SelectionStrategy) -> EvolutionParams {
    EvolutionParams {
        population_size: 20,
        genome_size: SizeBounds::new(1, 10),
        point_count: SizeBounds::new(3, 6),
        selection: SelectionParams {
            strategy: selection,
            elite_count: 2,
        },
        crossover: CrossoverParams {
            kind: CrossoverKind::OnePoint,
            probability: 0.9,
        },
        ..EvolutionParams::default()
    }
}

fn red_target() -> PixelBuffer {
    PixelBuffer::filled(4, 4, RED).unwrap()
}

#[test]
fn test_two_hundred_generations() {
    let params = params(SelectionStrategy::Tournament { size: 2 });
    let bounds = params.bounds();
    let mut population = Population::create(params, red_target(), 2024).unwrap();

    let mut best_so_far = f64::NEG_INFINITY;
    let mut first = None;
    for expected_gen in 0..200 {
        let stats = population.step(&flat_fill).unwrap();
        assert_eq!(stats.gen_id, expected_gen);
        first.get_or_insert(stats.max_fitness);

        // The global best never regresses
        assert!(stats.global_best_fitness >= best_so_far);
        assert_eq!(stats.improved, stats.global_best_fitness > best_so_far);
        best_so_far = stats.global_best_fitness;

        assert_eq!(population.organisms().len(), 20);
        for organism in population.organisms() {
            assert!(
                organism.genome().is_within(&bounds),
                "{:?}",
                organism.genome().bounds_violation(&bounds)
            );
        }
    }

    assert_eq!(population.gen_id(), 200);
    let best = population.best().unwrap();
    assert!((0.0..=1.0).contains(&best.fitness()));
    assert!(best.fitness() >= first.unwrap());
}

#[test]
fn test_every_selection_strategy_runs() {
    for strategy in [
        SelectionStrategy::Roulette,
        SelectionStrategy::Tournament { size: 3 },
        SelectionStrategy::Sus,
    ] {
        let mut population = Population::create(params(strategy), red_target(), 11).unwrap();
        let mut last = f64::NEG_INFINITY;
        for _ in 0..30 {
            let stats = population.step(&flat_fill).unwrap();
            assert!(stats.global_best_fitness >= last, "{strategy:?}");
            last = stats.global_best_fitness;
        }
    }
}

#[test]
fn test_elites_survive() {
    let mut population = Population::create(params(SelectionStrategy::Roulette), red_target(), 5)
        .unwrap();
    for _ in 0..20 {
        let stats = population.step(&flat_fill).unwrap();
        // The generation best is carried over unchanged under a new id
        let carried = population
            .organisms()
            .iter()
            .find(|o| o.genome() == stats.best.genome())
            .expect("best organism carried over");
        assert_eq!(carried.fitness(), Some(stats.max_fitness));
        assert_ne!(carried.id(), stats.best.id());
    }
}

#[test]
fn test_same_seed_same_run() {
    let run = |seed| {
        let mut population =
            Population::create(params(SelectionStrategy::Sus), red_target(), seed).unwrap();
        (0..10)
            .map(|_| population.step(&flat_fill).unwrap().max_fitness)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(77), run(77));
}

#[test]
fn test_snapshot_survives_json() {
    let params = params(SelectionStrategy::Tournament { size: 2 });
    let mut population = Population::create(params, red_target(), 8).unwrap();
    for _ in 0..5 {
        population.step(&flat_fill).unwrap();
    }
    let snapshot = population.serialize();
    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let restored =
        Population::restore(serde_json::from_str(&json).unwrap(), params, red_target(), 9).unwrap();

    assert_eq!(restored.serialize(), snapshot);
    assert_eq!(restored.gen_id(), 5);
    assert_eq!(
        restored.best().map(|b| b.fitness()),
        population.best().map(|b| b.fitness())
    );
}

#[test]
fn test_restore_into_other_target_fails() {
    let params = params(SelectionStrategy::Tournament { size: 2 });
    let population = Population::create(params, red_target(), 1).unwrap();
    let other = PixelBuffer::filled(5, 4, RED).unwrap();
    let err = Population::restore(population.serialize(), params, other, 1).unwrap_err();
    assert!(matches!(err, RestoreError::TargetMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "snapshot was taken against a 4x4 target, current target is 5x4"
    );
}
