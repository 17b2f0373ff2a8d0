//! Per-generation fitness statistics.

use crate::organism::Organism;

/// Summary of one evaluated generation.
///
/// Computed fresh on every step and never updated afterwards.
#[derive(Debug, Clone)]
pub struct GenerationStats {
    /// Generation these numbers describe.
    pub gen_id: u64,
    pub max_fitness: f64,
    pub mean_fitness: f64,
    pub min_fitness: f64,
    /// Population standard deviation of fitness.
    pub std_dev: f64,
    /// `true` when this generation beat the best fitness seen in every earlier one.
    pub improved: bool,
    /// Fittest organism of this generation.
    pub best: Organism,
    /// Best fitness of the whole run, including this generation.
    pub global_best_fitness: f64,
}

/// Order-independent moments of a fitness vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FitnessSummary {
    pub max: f64,
    pub mean: f64,
    pub min: f64,
    pub std_dev: f64,
    /// Index of the first organism holding `max`.
    pub best_index: usize,
}

impl FitnessSummary {
    /// `None` for an empty slice.
    #[expect(clippy::cast_precision_loss)]
    pub fn new(fitness: &[f64]) -> Option<Self> {
        let (&first, rest) = fitness.split_first()?;
        let mut max = first;
        let mut min = first;
        let mut best_index = 0;
        for (i, &f) in rest.iter().enumerate() {
            if f > max {
                max = f;
                best_index = i + 1;
            }
            min = min.min(f);
        }
        let n = fitness.len() as f64;
        let mean = fitness.iter().sum::<f64>() / n;
        let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            max,
            mean,
            min,
            std_dev: variance.sqrt(),
            best_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let s = FitnessSummary::new(&[0.2, 0.8, 0.4, 0.8, 0.3]).unwrap();
        assert_eq!(s.max, 0.8);
        assert_eq!(s.min, 0.2);
        assert!((s.mean - 0.5).abs() < 1e-12);
        // deviations: -0.3, 0.3, -0.1, 0.3, -0.2 -> variance 0.32 / 5
        assert!((s.std_dev - (0.064_f64).sqrt()).abs() < 1e-12);
        assert_eq!(s.best_index, 1);
    }

    #[test]
    fn test_single_value() {
        let s = FitnessSummary::new(&[0.5]).unwrap();
        assert_eq!((s.max, s.min, s.mean, s.std_dev), (0.5, 0.5, 0.5, 0.0));
    }

    #[test]
    fn test_empty() {
        assert!(FitnessSummary::new(&[]).is_none());
    }
}
