use std::{fs, num::NonZeroUsize, path::PathBuf};

use anyhow::Context;
use chrono::Utc;
use polyevo_engine::{
    BestOrganism, EvolutionParams, GenerationStats, PixelBuffer, Population, Rasterizer as _,
    crossover::CrossoverKind, selection::SelectionStrategy,
};
use polyevo_raster::SoftwareRasterizer;
use rand::Rng as _;

use crate::{model::checkpoint::Checkpoint, util};

const CHECKPOINT_FILE: &str = "snapshot.json";
const BEST_IMAGE_FILE: &str = "best.png";

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
enum SelectionKind {
    Roulette,
    #[default]
    Tournament,
    Sus,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvolveArg {
    /// Target image (PNG)
    #[arg(long)]
    target: PathBuf,
    /// Evolution parameters JSON file (see the `params` command)
    #[arg(long)]
    params: Option<PathBuf>,
    /// Random seed (drawn from the OS if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Number of generations to run
    #[arg(long, default_value_t = 1000)]
    generations: u64,
    /// Stop once the best fitness reaches this value
    #[arg(long)]
    target_fitness: Option<f64>,
    /// Resume from a checkpoint written by a previous run
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Directory for checkpoints and images
    #[arg(long, default_value = "polyevo-out")]
    output_dir: PathBuf,
    /// Save a checkpoint every N generations
    #[arg(long, default_value_t = 100)]
    save_interval: u64,
    /// Report statistics every N generations (improvements are always reported)
    #[arg(long, default_value_t = 10)]
    report_interval: u64,
    /// Only print the final summary
    #[arg(long)]
    quiet: bool,
    /// Render hard polygon edges
    #[arg(long)]
    no_anti_alias: bool,
    #[clap(flatten)]
    overrides: ParamOverrides,
}

/// Flags that take precedence over the params file.
#[derive(Default, Debug, Clone, clap::Args)]
struct ParamOverrides {
    /// Population size (even, at least 2)
    #[arg(long)]
    population: Option<usize>,
    /// Selection strategy: roulette, tournament or sus
    #[arg(long)]
    selection: Option<SelectionKind>,
    /// Tournament size (tournament selection only)
    #[arg(long)]
    tournament_size: Option<usize>,
    /// Organisms copied unchanged into the next generation (even)
    #[arg(long)]
    elite_count: Option<usize>,
    /// Crossover operator: one-point, two-point or uniform
    #[arg(long)]
    crossover: Option<CrossoverKind>,
    /// Crossover probability
    #[arg(long)]
    crossover_probability: Option<f64>,
    /// Fitness evaluation threads
    #[arg(long)]
    workers: Option<NonZeroUsize>,
}

impl ParamOverrides {
    fn apply(&self, params: &mut EvolutionParams) {
        if let Some(population) = self.population {
            params.population_size = population;
        }
        if let Some(kind) = self.selection {
            params.selection.strategy = match kind {
                SelectionKind::Roulette => SelectionStrategy::Roulette,
                SelectionKind::Sus => SelectionStrategy::Sus,
                SelectionKind::Tournament => match params.selection.strategy {
                    tournament @ SelectionStrategy::Tournament { .. } => tournament,
                    _ => SelectionStrategy::default(),
                },
            };
        }
        if let Some(size) = self.tournament_size
            && let SelectionStrategy::Tournament { size: current } = &mut params.selection.strategy
        {
            *current = size;
        }
        if let Some(elite_count) = self.elite_count {
            params.selection.elite_count = elite_count;
        }
        if let Some(kind) = self.crossover {
            params.crossover.kind = kind;
        }
        if let Some(probability) = self.crossover_probability {
            params.crossover.probability = probability;
        }
        if let Some(workers) = self.workers {
            params.fitness.workers = Some(workers);
        }
    }
}

pub(crate) fn run(arg: &EvolveArg) -> anyhow::Result<()> {
    let target = util::read_png_file(&arg.target)?;

    let resumed = arg
        .resume
        .as_ref()
        .map(util::read_checkpoint_file)
        .transpose()?;
    let mut params = match (&arg.params, &resumed) {
        (Some(path), _) => util::read_params_file(path)?,
        (None, Some(checkpoint)) => checkpoint.params,
        (None, None) => EvolutionParams::default(),
    };
    arg.overrides.apply(&mut params);
    params
        .validate()
        .context("Invalid evolution parameters")?;

    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    eprintln!("Target: {} ({}x{})", arg.target.display(), target.width(), target.height());
    eprintln!("Seed: {seed}");
    eprintln!(
        "Population: {}, genome size: {}..={}, points: {}..={}",
        params.population_size,
        params.genome_size.min,
        params.genome_size.max,
        params.point_count.min,
        params.point_count.max
    );

    let mut population = match resumed {
        Some(checkpoint) => {
            let snapshot = checkpoint.snapshot;
            eprintln!("Resuming from generation #{}", snapshot.gen_id);
            Population::restore(snapshot, params, target, seed)
                .context("Failed to restore population from checkpoint")?
        }
        None => Population::create(params, target, seed)?,
    };

    fs::create_dir_all(&arg.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            arg.output_dir.display()
        )
    })?;

    let rasterizer = SoftwareRasterizer::new(!arg.no_anti_alias);
    let save_interval = arg.save_interval.max(1);
    let report_interval = arg.report_interval.max(1);
    let mut improved_since_save = false;
    let mut last_stats = None;

    for i in 0..arg.generations {
        let stats = population.step(&rasterizer)?;
        improved_since_save |= stats.improved;
        if !arg.quiet && (stats.improved || stats.gen_id % report_interval == 0) {
            report(&stats);
        }

        let reached = arg
            .target_fitness
            .is_some_and(|f| stats.global_best_fitness >= f);
        let done = reached || i + 1 == arg.generations;
        if done || (i + 1) % save_interval == 0 {
            save(&population, &rasterizer, arg, seed, improved_since_save)?;
            improved_since_save = false;
        }
        last_stats = Some(stats);
        if reached {
            eprintln!("Target fitness reached");
            break;
        }
    }

    eprintln!();
    eprintln!("Evolution finished at generation #{}", population.gen_id());
    if let Some(stats) = &last_stats {
        eprintln!("  Last generation mean: {:.5}", stats.mean_fitness);
    }
    if let Some(best) = population.best() {
        eprintln!(
            "  Best: {} from generation #{} => {:.5}",
            best.organism.id(),
            best.gen_id,
            best.fitness()
        );
        eprintln!("  Polygons: {}", best.organism.genome().len());
    }
    eprintln!("  Output: {}", arg.output_dir.display());

    Ok(())
}

fn report(stats: &GenerationStats) {
    let marker = if stats.improved { " *" } else { "" };
    eprintln!("Generation #{}{marker}:", stats.gen_id);
    eprintln!(
        "  Fitness: max {:.5}, mean {:.5}, min {:.5}, std {:.5}",
        stats.max_fitness, stats.mean_fitness, stats.min_fitness, stats.std_dev
    );
    eprintln!(
        "  Best: {} ({} polygons), global best {:.5}",
        stats.best.id(),
        stats.best.genome().len(),
        stats.global_best_fitness
    );
}

fn save(
    population: &Population,
    rasterizer: &SoftwareRasterizer,
    arg: &EvolveArg,
    seed: u64,
    improved: bool,
) -> anyhow::Result<()> {
    let checkpoint = Checkpoint {
        saved_at: Utc::now(),
        seed,
        params: *population.params(),
        snapshot: population.serialize(),
    };
    util::write_json_file(&checkpoint, arg.output_dir.join(CHECKPOINT_FILE))?;

    let Some(image) = best_image(population, rasterizer) else {
        return Ok(());
    };
    util::write_png_file(&image, arg.output_dir.join(BEST_IMAGE_FILE))?;
    if improved && let Some(best) = population.best() {
        util::write_png_file(&image, arg.output_dir.join(improvement_file(best)))?;
    }
    Ok(())
}

/// Named after the generation that produced the organism, not the one about to run.
fn improvement_file(best: &BestOrganism) -> String {
    format!("generation_{:05}.png", best.gen_id)
}

/// The global best's cached phenotype, re-rendered when it was restored without one.
fn best_image(population: &Population, rasterizer: &SoftwareRasterizer) -> Option<PixelBuffer> {
    let best = &population.best()?.organism;
    let image = best.phenotype().cloned().unwrap_or_else(|| {
        let (width, height) = population.target().dimensions();
        rasterizer.rasterize(best.genome(), width, height)
    });
    Some(image)
}
