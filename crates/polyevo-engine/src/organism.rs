//! Organisms: a genome with an identity and a lazily computed fitness.

use serde::{Deserialize, Serialize};

use crate::{genome::Genome, raster::PixelBuffer};

/// Run-wide organism identifier. Ids only ever increase.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
#[display("#{_0}")]
pub struct OrganismId(pub u64);

/// One candidate solution.
///
/// An organism's genome never changes after creation. Anything that produces a new
/// genome produces a new organism with a fresh id and no fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Organism {
    id: OrganismId,
    genome: Genome,
    fitness: Option<f64>,
    phenotype: Option<PixelBuffer>,
}

impl Organism {
    #[must_use]
    pub fn new(id: OrganismId, genome: Genome) -> Self {
        Self {
            id,
            genome,
            fitness: None,
            phenotype: None,
        }
    }

    /// Rebuilds an organism from stored parts, keeping a known fitness.
    #[must_use]
    pub fn with_fitness(id: OrganismId, genome: Genome, fitness: Option<f64>) -> Self {
        Self {
            id,
            genome,
            fitness,
            phenotype: None,
        }
    }

    /// Same genome, fitness and phenotype under a new id (elitist carry-over).
    #[must_use]
    pub fn clone_as(&self, id: OrganismId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn id(&self) -> OrganismId {
        self.id
    }

    #[must_use]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// `None` until the organism has been evaluated.
    #[must_use]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// The last rendered image, if it was kept.
    #[must_use]
    pub fn phenotype(&self) -> Option<&PixelBuffer> {
        self.phenotype.as_ref()
    }

    pub(crate) fn set_evaluation(&mut self, fitness: f64, phenotype: Option<PixelBuffer>) {
        self.fitness = Some(fitness);
        self.phenotype = phenotype;
    }

    pub(crate) fn set_phenotype(&mut self, phenotype: Option<PixelBuffer>) {
        self.phenotype = phenotype;
    }
}

/// Serialized form of an organism (the phenotype is never stored).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganismRecord {
    pub id: OrganismId,
    pub genome: Genome,
    pub fitness: Option<f64>,
}

impl From<&Organism> for OrganismRecord {
    fn from(organism: &Organism) -> Self {
        Self {
            id: organism.id,
            genome: organism.genome.clone(),
            fitness: organism.fitness,
        }
    }
}

impl From<OrganismRecord> for Organism {
    fn from(record: OrganismRecord) -> Self {
        Self::with_fitness(record.id, record.genome, record.fitness)
    }
}
