//! Crossover operators over chromosome lists.
//!
//! Whole chromosomes are exchanged, never split, so a polygon's points and color
//! always stay together. Parents may differ in length:
//!
//! - **One-point** - the cut is drawn over the longer parent; each child takes its own
//!   parent's head and the other parent's tail, each clipped to the real length.
//! - **Two-point** - two ordered cuts over the longer parent; the middle segment is
//!   swapped.
//! - **Uniform** - each slot shared by both parents swaps with probability 0.5; slots
//!   past the shorter parent stay with their own parent.
//!
//! Every child length lies between the parents' lengths, so size bounds that hold for
//! both parents hold for both children.

use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    genome::{Chromosome, Genome},
    random::RandomSource as _,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossoverKind {
    #[default]
    OnePoint,
    TwoPoint,
    Uniform,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown crossover kind {name:?} (expected one-point, two-point or uniform)")]
pub struct ParseCrossoverKindError {
    name: String,
}

/// Accepts the kebab-case names used in params files, case-insensitively. `_` is
/// read as `-` and the dash may be left out (`two-point`, `two_point`, `TwoPoint`).
impl FromStr for CrossoverKind {
    type Err = ParseCrossoverKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "onepoint" => Ok(Self::OnePoint),
            "twopoint" => Ok(Self::TwoPoint),
            "uniform" => Ok(Self::Uniform),
            _ => Err(ParseCrossoverKindError { name: s.to_owned() }),
        }
    }
}

/// Crossover configuration for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossoverParams {
    pub kind: CrossoverKind,
    /// Chance that a pair recombines; otherwise the children are plain copies.
    pub probability: f64,
}

impl Default for CrossoverParams {
    fn default() -> Self {
        Self {
            kind: CrossoverKind::OnePoint,
            probability: 0.9,
        }
    }
}

impl CrossoverKind {
    /// Produces two children from `a` and `b`.
    ///
    /// With probability `1 - probability` the parents are copied unchanged.
    pub fn cross<R>(self, a: &Genome, b: &Genome, probability: f64, rng: &mut R) -> (Genome, Genome)
    where
        R: Rng + ?Sized,
    {
        if !rng.chance(probability) {
            return (a.clone(), b.clone());
        }
        let (a, b) = (a.chromosomes(), b.chromosomes());
        let longest = a.len().max(b.len());
        let (x, y) = match self {
            Self::OnePoint => {
                let cut = rng.uniform_int(longest + 1);
                (splice(a, b, cut, longest), splice(b, a, cut, longest))
            }
            Self::TwoPoint => {
                let c1 = rng.uniform_int(longest + 1);
                let c2 = rng.uniform_int(longest + 1);
                let (lo, hi) = (c1.min(c2), c1.max(c2));
                (swap_middle(a, b, lo, hi), swap_middle(b, a, lo, hi))
            }
            Self::Uniform => uniform(a, b, rng),
        };
        (Genome::new(x), Genome::new(y))
    }
}

fn segment(chromosomes: &[Chromosome], from: usize, to: usize) -> &[Chromosome] {
    let len = chromosomes.len();
    &chromosomes[from.min(len)..to.min(len)]
}

/// `head[..cut] + tail[cut..]`
fn splice(head: &[Chromosome], tail: &[Chromosome], cut: usize, end: usize) -> Vec<Chromosome> {
    [segment(head, 0, cut), segment(tail, cut, end)].concat()
}

/// `outer[..lo] + inner[lo..hi] + outer[hi..]`
fn swap_middle(outer: &[Chromosome], inner: &[Chromosome], lo: usize, hi: usize) -> Vec<Chromosome> {
    let end = outer.len().max(inner.len());
    [
        segment(outer, 0, lo),
        segment(inner, lo, hi),
        segment(outer, hi, end),
    ]
    .concat()
}

fn uniform<R>(a: &[Chromosome], b: &[Chromosome], rng: &mut R) -> (Vec<Chromosome>, Vec<Chromosome>)
where
    R: Rng + ?Sized,
{
    let mut x = a.to_vec();
    let mut y = b.to_vec();
    for i in 0..a.len().min(b.len()) {
        if rng.chance(0.5) {
            std::mem::swap(&mut x[i], &mut y[i]);
        }
    }
    (x, y)
}
