//! Serializable population state for pause/resume and migration.
//!
//! The format is plain serde data:
//!
//! ```json
//! {
//!   "genId": 12,
//!   "target": { "width": 64, "height": 48 },
//!   "organisms": [{ "id": 301, "genome": [...], "fitness": 0.91 }],
//!   "best": { "id": 288, "genome": [...], "fitness": 0.93, "genId": 11 }
//! }
//! ```
//!
//! Generator state is not stored; a restored population continues with a fresh seed.

use serde::{Deserialize, Serialize};

use crate::{
    genome::Genome,
    organism::{OrganismId, OrganismRecord},
    params::ConfigError,
};

/// Dimensions of the target image a snapshot was taken against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[display("{width}x{height}")]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

/// Best organism of the run and the generation it appeared in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestRecord {
    pub id: OrganismId,
    pub genome: Genome,
    pub fitness: f64,
    pub gen_id: u64,
}

/// Complete description of a population at one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub gen_id: u64,
    pub target: TargetSize,
    pub organisms: Vec<OrganismRecord>,
    pub best: Option<BestRecord>,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum RestoreError {
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("snapshot was taken against a {snapshot} target, current target is {current}")]
    #[from(ignore)]
    TargetMismatch {
        snapshot: TargetSize,
        current: TargetSize,
    },
    #[display("snapshot holds {actual} organisms, configured population size is {expected}")]
    #[from(ignore)]
    OrganismCount { expected: usize, actual: usize },
    #[display("organism {id} violates the configured bounds: {reason}")]
    #[from(ignore)]
    InvalidGenome { id: OrganismId, reason: String },
    #[display("organism {id} has fitness {fitness} outside [0, 1]")]
    #[from(ignore)]
    InvalidFitness { id: OrganismId, fitness: f64 },
    #[display("organism id {id} appears more than once")]
    #[from(ignore)]
    DuplicateId { id: OrganismId },
}
