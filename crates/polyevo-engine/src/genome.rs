//! Genome representation: polygons made of normalized points and a color.
//!
//! - [`Point`] - a vertex with both axes in `[0, 1]`, relative to the canvas
//! - [`Color`] - straight RGBA with every channel in `[0, 1]`
//! - [`Chromosome`] - one polygon (ordered points + color)
//! - [`Genome`] - ordered chromosomes, painted back to front
//!
//! Scaling to pixel space is the rasterizer's job. The genome only guarantees that
//! every coordinate and channel stays in `[0, 1]` and that point and chromosome
//! counts stay inside the configured [`SizeBounds`].

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

/// Inclusive `[min, max]` bounds on a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub min: usize,
    pub max: usize,
}

impl SizeBounds {
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }

    /// Uniform count in `[min, max]`.
    pub fn random<R>(&self, rng: &mut R) -> usize
    where
        R: RandomSource + ?Sized,
    {
        self.min + rng.uniform_int(self.max - self.min + 1)
    }
}

/// Size bounds that every genome of a run must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeBounds {
    /// Chromosomes per genome.
    pub genome_size: SizeBounds,
    /// Points per chromosome.
    pub point_count: SizeBounds,
}

/// A polygon vertex in normalized canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a point, clamping both axes into `[0, 1]`.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    pub fn random<R>(rng: &mut R) -> Self
    where
        R: RandomSource + ?Sized,
    {
        Self::new(rng.uniform(), rng.uniform())
    }

    /// Adds `N(0, sigma)` noise to each axis and clamps the result.
    pub fn tweak<R>(&mut self, sigma: f64, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        *self = Self::new(rng.gaussian(self.x, sigma), rng.gaussian(self.y, sigma));
    }

    #[must_use]
    pub fn is_normalized(&self) -> bool {
        unit_range(self.x) && unit_range(self.y)
    }
}

/// Straight (non-premultiplied) RGBA color, channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    /// Creates a color, clamping every channel into `[0, 1]`.
    #[must_use]
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn random<R>(rng: &mut R) -> Self
    where
        R: RandomSource + ?Sized,
    {
        Self::new(rng.uniform(), rng.uniform(), rng.uniform(), rng.uniform())
    }

    /// Adds `N(0, sigma)` noise to each channel and clamps the result.
    pub fn tweak<R>(&mut self, sigma: f64, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        *self = Self::new(
            rng.gaussian(self.r, sigma),
            rng.gaussian(self.g, sigma),
            rng.gaussian(self.b, sigma),
            rng.gaussian(self.a, sigma),
        );
    }

    /// Channels as `[r, g, b, a]` bytes.
    #[must_use]
    pub fn to_rgba8(&self) -> [u8; 4] {
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let to_u8 = |c: f64| (c * 255.0).round() as u8;
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    #[must_use]
    pub fn is_normalized(&self) -> bool {
        [self.r, self.g, self.b, self.a].into_iter().all(unit_range)
    }
}

fn unit_range(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

/// One polygon: the points (in winding order) and its fill color.
///
/// Points and color always travel together; crossover moves whole chromosomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    points: Vec<Point>,
    color: Color,
}

impl Chromosome {
    #[must_use]
    pub fn new(points: Vec<Point>, color: Color) -> Self {
        Self { points, color }
    }

    /// Random polygon with a point count drawn from `point_count`.
    pub fn random<R>(point_count: SizeBounds, rng: &mut R) -> Self
    where
        R: RandomSource + ?Sized,
    {
        let n = point_count.random(rng);
        let points = (0..n).map(|_| Point::random(rng)).collect();
        Self {
            points,
            color: Color::random(rng),
        }
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [Point] {
        &mut self.points
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn color_mut(&mut self) -> &mut Color {
        &mut self.color
    }

    /// Inserts a random point at a random position unless the polygon is full.
    ///
    /// Returns whether a point was inserted.
    pub fn insert_random_point<R>(&mut self, point_count: SizeBounds, rng: &mut R) -> bool
    where
        R: RandomSource + ?Sized,
    {
        if self.points.len() >= point_count.max {
            return false;
        }
        let at = rng.uniform_int(self.points.len() + 1);
        self.points.insert(at, Point::random(rng));
        true
    }

    /// Removes a random point unless the polygon is at its floor.
    ///
    /// Returns whether a point was removed.
    pub fn remove_random_point<R>(&mut self, point_count: SizeBounds, rng: &mut R) -> bool
    where
        R: RandomSource + ?Sized,
    {
        if self.points.len() <= point_count.min || self.points.is_empty() {
            return false;
        }
        let at = rng.uniform_int(self.points.len());
        self.points.remove(at);
        true
    }
}

/// The ordered chromosomes of one organism. Later chromosomes paint on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome {
    chromosomes: Vec<Chromosome>,
}

impl Genome {
    #[must_use]
    pub fn new(chromosomes: Vec<Chromosome>) -> Self {
        Self { chromosomes }
    }

    /// Random genome whose size and polygons respect `bounds`.
    pub fn random<R>(bounds: &GenomeBounds, rng: &mut R) -> Self
    where
        R: RandomSource + ?Sized,
    {
        let n = bounds.genome_size.random(rng);
        let chromosomes = (0..n)
            .map(|_| Chromosome::random(bounds.point_count, rng))
            .collect();
        Self { chromosomes }
    }

    #[must_use]
    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    pub fn chromosomes_mut(&mut self) -> &mut Vec<Chromosome> {
        &mut self.chromosomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Checks every size bound and value range.
    #[must_use]
    pub fn is_within(&self, bounds: &GenomeBounds) -> bool {
        self.bounds_violation(bounds).is_none()
    }

    /// Describes the first violated bound, if any.
    #[must_use]
    pub fn bounds_violation(&self, bounds: &GenomeBounds) -> Option<String> {
        if !bounds.genome_size.contains(self.len()) {
            return Some(format!(
                "genome has {} chromosomes, expected {}..={}",
                self.len(),
                bounds.genome_size.min,
                bounds.genome_size.max
            ));
        }
        for (i, chromosome) in self.chromosomes.iter().enumerate() {
            let n = chromosome.points.len();
            if !bounds.point_count.contains(n) {
                return Some(format!(
                    "chromosome #{i} has {n} points, expected {}..={}",
                    bounds.point_count.min, bounds.point_count.max
                ));
            }
            if !chromosome.points.iter().all(Point::is_normalized) {
                return Some(format!("chromosome #{i} has a point outside [0, 1]"));
            }
            if !chromosome.color.is_normalized() {
                return Some(format!("chromosome #{i} has a color channel outside [0, 1]"));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random;

    const BOUNDS: GenomeBounds = GenomeBounds {
        genome_size: SizeBounds::new(1, 10),
        point_count: SizeBounds::new(3, 6),
    };

    #[test]
    fn test_random_genome_respects_bounds() {
        let mut rng = random::seeded(1);
        for _ in 0..200 {
            let genome = Genome::random(&BOUNDS, &mut rng);
            assert!(genome.is_within(&BOUNDS), "{:?}", genome.bounds_violation(&BOUNDS));
        }
    }

    #[test]
    fn test_random_sizes_cover_range() {
        let mut rng = random::seeded(2);
        let bounds = SizeBounds::new(2, 4);
        let mut seen = [false; 5];
        for _ in 0..200 {
            seen[bounds.random(&mut rng)] = true;
        }
        assert_eq!(seen, [false, false, true, true, true]);
    }

    #[test]
    fn test_tweak_clamps() {
        let mut rng = random::seeded(3);
        let mut point = Point::new(0.99, 0.01);
        let mut color = Color::new(1.0, 0.0, 0.5, 0.5);
        for _ in 0..1000 {
            point.tweak(5.0, &mut rng);
            color.tweak(5.0, &mut rng);
            assert!(point.is_normalized());
            assert!(color.is_normalized());
        }
    }

    #[test]
    fn test_point_insert_and_remove_respect_bounds() {
        let mut rng = random::seeded(4);
        let bounds = SizeBounds::new(3, 4);
        let mut chromosome = Chromosome::random(SizeBounds::new(3, 3), &mut rng);

        assert!(!chromosome.remove_random_point(bounds, &mut rng));
        assert!(chromosome.insert_random_point(bounds, &mut rng));
        assert_eq!(chromosome.points().len(), 4);
        assert!(!chromosome.insert_random_point(bounds, &mut rng));
        assert!(chromosome.remove_random_point(bounds, &mut rng));
        assert_eq!(chromosome.points().len(), 3);
    }

    #[test]
    fn test_color_to_rgba8() {
        assert_eq!(Color::new(1.0, 0.0, 0.5, 2.0).to_rgba8(), [255, 0, 128, 255]);
    }

    #[test]
    fn test_bounds_violation_messages() {
        let genome = Genome::new(vec![]);
        assert!(genome.bounds_violation(&BOUNDS).unwrap().contains("0 chromosomes"));

        let triangle = Chromosome::new(
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
            Color::new(0.0, 0.0, 0.0, 1.0),
        );
        let genome = Genome::new(vec![triangle]);
        assert!(genome.bounds_violation(&BOUNDS).unwrap().contains("2 points"));
    }

    #[test]
    fn test_genome_serializes_as_array() {
        let genome = Genome::new(vec![Chromosome::new(
            vec![Point::new(0.5, 0.25)],
            Color::new(1.0, 0.0, 0.0, 0.5),
        )]);
        let json = serde_json::to_string(&genome).unwrap();
        assert_eq!(
            json,
            r#"[{"points":[{"x":0.5,"y":0.25}],"color":{"r":1.0,"g":0.0,"b":0.0,"a":0.5}}]"#
        );
        let back: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, genome);
    }
}
