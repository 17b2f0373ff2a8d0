//! Genetic algorithm that evolves sets of translucent polygons toward a target image.
//!
//! A [`Genome`] is an ordered list of [`Chromosome`]s, each one polygon with a color.
//! Genomes are rendered to a [`PixelBuffer`] by a caller-supplied [`Rasterizer`] and
//! scored against the target by pixel difference. A [`Population`] drives the loop.
//!
//! # How Evolution Works
//!
//! 1. **Population** - Generation 0 is filled with random genomes within the configured bounds
//! 2. **Evaluation** - Each unscored organism is rasterized and compared with the target
//! 3. **Elitism** - The top organisms are copied unchanged into the next generation
//! 4. **Selection** - Parent pairs are drawn by roulette, tournament or SUS
//! 5. **Reproduction** - Pairs are crossed over and the children mutated
//! 6. **Repeat** - The caller keeps calling [`Population::step`] until it is satisfied
//!
//! # Architecture
//!
//! ```text
//! Population (generation loop, ids, global best)
//!     ↓ scores with
//! FitnessEvaluator ── Rasterizer (genome → pixels, supplied by the caller)
//!     ↓ feeds
//! SelectionStrategy ── AliasSampler
//!     ↓ pairs for
//! CrossoverKind → MutationParams (rates ramp with the global best fitness)
//!     ↓ persisted as
//! Snapshot
//! ```
//!
//! # Modules
//!
//! - [`genome`] - Points, colors, chromosomes, genomes and their size bounds
//! - [`raster`] - Pixel buffers and the [`Rasterizer`] seam
//! - [`fitness`] - Pixel-difference scoring, optionally in parallel
//! - [`selection`] / [`alias`] - Parent selection and the alias sampler behind it
//! - [`crossover`] / [`mutation`] - Genetic operators
//! - [`params`] - Run configuration and its validation
//! - [`population`] / [`snapshot`] - The generation state machine and its serialized form
//! - [`random`] - Seeded generators shared by every operator

pub use self::{
    fitness::{DifferenceMetric, FitnessError, FitnessEvaluator, FitnessParams},
    genome::{Chromosome, Color, Genome, GenomeBounds, Point, SizeBounds},
    organism::{Organism, OrganismId},
    params::{ConfigError, EvolutionParams, SelectionParams},
    population::{BestOrganism, Population, StepError},
    raster::{PixelBuffer, PixelBufferError, Rasterizer},
    snapshot::{RestoreError, Snapshot},
    stats::GenerationStats,
};

pub mod alias;
pub mod crossover;
pub mod fitness;
pub mod genome;
pub mod mutation;
pub mod organism;
pub mod params;
pub mod population;
pub mod random;
pub mod raster;
pub mod selection;
pub mod snapshot;
pub mod stats;
