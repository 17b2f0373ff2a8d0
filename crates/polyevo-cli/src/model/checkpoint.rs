use chrono::{DateTime, Utc};
use polyevo_engine::{EvolutionParams, Genome, Snapshot};
use serde::{Deserialize, Serialize};

/// Everything `evolve` writes to `snapshot.json`: enough to resume the run or
/// render its best organism later.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Checkpoint {
    pub saved_at: DateTime<Utc>,
    /// Seed the run (or its latest resume) started from.
    pub seed: u64,
    pub params: EvolutionParams,
    pub snapshot: Snapshot,
}

impl Checkpoint {
    /// The run's best genome, falling back to the fittest stored organism when the
    /// snapshot was taken before any generation was evaluated.
    #[must_use]
    pub fn best_genome(&self) -> Option<&Genome> {
        if let Some(best) = &self.snapshot.best {
            return Some(&best.genome);
        }
        self.snapshot
            .organisms
            .iter()
            .max_by(|a, b| {
                let a = a.fitness.unwrap_or(f64::NEG_INFINITY);
                let b = b.fitness.unwrap_or(f64::NEG_INFINITY);
                a.total_cmp(&b)
            })
            .map(|record| &record.genome)
    }
}
