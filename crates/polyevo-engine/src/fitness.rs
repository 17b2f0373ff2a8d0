//! Fitness: how close a rendered genome is to the target image.
//!
//! The score is `1 - error / max_error`, where the error is the per-channel
//! difference summed over every pixel and `max_error` is the worst possible sum for
//! the image size. Identical images score exactly `1.0`; the score is always in
//! `[0, 1]`.
//!
//! Evaluation is pure given the rasterizer. [`FitnessEvaluator::evaluate_all`] fans
//! out over scoped worker threads; every result lands at its input index, so the
//! caller sees the same output regardless of scheduling.

use std::{num::NonZeroUsize, thread};

use serde::{Deserialize, Serialize};

use crate::{
    genome::Genome,
    raster::{CHANNELS, PixelBuffer, Rasterizer},
};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum FitnessError {
    #[display(
        "rasterizer produced a {actual_width}x{actual_height} image for a {expected_width}x{expected_height} target"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Per-channel difference used by the fitness function.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "kebab-case")]
pub enum DifferenceMetric {
    /// `|a - b|`, normalized by `255` per channel.
    #[default]
    Absolute,
    /// `(a - b)²`, normalized by `255²` per channel. Punishes large errors harder.
    Squared,
}

impl DifferenceMetric {
    fn channel_error(self, a: u8, b: u8) -> u64 {
        let d = u64::from(a.abs_diff(b));
        match self {
            Self::Absolute => d,
            Self::Squared => d * d,
        }
    }

    fn channel_max(self) -> u64 {
        match self {
            Self::Absolute => 255,
            Self::Squared => 255 * 255,
        }
    }
}

/// Fitness settings that belong to the run configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitnessParams {
    #[serde(default)]
    pub metric: DifferenceMetric,
    /// Worker threads for evaluation. `None` uses the available parallelism.
    #[serde(default)]
    pub workers: Option<NonZeroUsize>,
}

/// Scored result of one evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub fitness: f64,
    pub phenotype: PixelBuffer,
}

/// Compares rasterized genomes against a target.
#[derive(Debug, Clone, Copy)]
pub struct FitnessEvaluator {
    metric: DifferenceMetric,
    workers: NonZeroUsize,
}

impl FitnessEvaluator {
    #[must_use]
    pub fn new(params: FitnessParams) -> Self {
        let workers = params.workers.unwrap_or_else(|| {
            thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
        });
        Self {
            metric: params.metric,
            workers,
        }
    }

    /// Fitness of two same-sized buffers.
    ///
    /// # Panics
    ///
    /// Panics if the buffers differ in size. [`Self::evaluate`] checks this first.
    #[must_use]
    pub fn score(&self, phenotype: &PixelBuffer, target: &PixelBuffer) -> f64 {
        assert_eq!(phenotype.dimensions(), target.dimensions());
        let error: u64 = phenotype
            .as_bytes()
            .iter()
            .zip(target.as_bytes())
            .map(|(&a, &b)| self.metric.channel_error(a, b))
            .sum();
        let max_error = self.metric.channel_max() * (target.pixel_count() * CHANNELS) as u64;
        #[expect(clippy::cast_precision_loss)]
        let normalized = error as f64 / max_error as f64;
        (1.0 - normalized).clamp(0.0, 1.0)
    }

    /// Rasterizes `genome` at the target's size and scores it.
    pub fn evaluate<R>(
        &self,
        genome: &Genome,
        target: &PixelBuffer,
        rasterizer: &R,
    ) -> Result<Evaluation, FitnessError>
    where
        R: Rasterizer + ?Sized,
    {
        let (width, height) = target.dimensions();
        let phenotype = rasterizer.rasterize(genome, width, height);
        if phenotype.dimensions() != target.dimensions() {
            return Err(FitnessError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                actual_width: phenotype.width(),
                actual_height: phenotype.height(),
            });
        }
        let fitness = self.score(&phenotype, target);
        Ok(Evaluation { fitness, phenotype })
    }

    /// Evaluates every genome, splitting the work into contiguous chunks across
    /// worker threads. Output order matches input order.
    ///
    /// Returns the first error in input order if any evaluation fails.
    pub fn evaluate_all<R>(
        &self,
        genomes: &[&Genome],
        target: &PixelBuffer,
        rasterizer: &R,
    ) -> Result<Vec<Evaluation>, FitnessError>
    where
        R: Rasterizer + Sync + ?Sized,
    {
        let workers = self.workers.get().min(genomes.len());
        if workers <= 1 {
            return genomes
                .iter()
                .map(|genome| self.evaluate(genome, target, rasterizer))
                .collect();
        }

        let chunk_size = genomes.len().div_ceil(workers);
        let mut results: Vec<Option<Result<Evaluation, FitnessError>>> =
            (0..genomes.len()).map(|_| None).collect();
        thread::scope(|s| {
            for (chunk, slots) in genomes
                .chunks(chunk_size)
                .zip(results.chunks_mut(chunk_size))
            {
                s.spawn(move || {
                    for (genome, slot) in chunk.iter().zip(slots) {
                        *slot = Some(self.evaluate(genome, target, rasterizer));
                    }
                });
            }
        });

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| unreachable!("every slot is filled by its worker")))
            .collect()
    }
}
