//! Software rasterizer and PNG helpers for `polyevo-engine`.
//!
//! [`SoftwareRasterizer`] implements the engine's [`Rasterizer`] capability with
//! `tiny-skia`: every genome is painted onto a white, opaque canvas, chromosome by
//! chromosome, with source-over compositing and a non-zero winding fill.
//!
//! `tiny-skia` stores premultiplied pixels while the engine works with straight
//! RGBA. Rendered canvases are opaque, so demultiplying them is exact. Image files
//! are read and written as straight RGBA through `image`, never through a
//! [`Pixmap`], so translucent target pixels keep their exact color.
//!
//! # Example
//!
//! ```
//! use polyevo_engine::{Chromosome, Color, Genome, Point, Rasterizer as _};
//! use polyevo_raster::SoftwareRasterizer;
//!
//! let square = Chromosome::new(
//!     vec![
//!         Point::new(0.0, 0.0),
//!         Point::new(1.0, 0.0),
//!         Point::new(1.0, 1.0),
//!         Point::new(0.0, 1.0),
//!     ],
//!     Color::new(0.0, 0.0, 1.0, 1.0),
//! );
//! let image = SoftwareRasterizer::default().rasterize(&Genome::new(vec![square]), 8, 8);
//! assert_eq!(image.pixel(4, 4), [0, 0, 255, 255]);
//! ```

use std::path::{Path, PathBuf};

use image::{ExtendedColorType, ImageFormat};
use polyevo_engine::{Chromosome, Genome, PixelBuffer, PixelBufferError, Rasterizer};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum RasterError {
    #[display("cannot allocate a {width}x{height} canvas")]
    #[from(ignore)]
    CanvasSize { width: u32, height: u32 },
    #[display("invalid pixel buffer: {_0}")]
    PixelBuffer(PixelBufferError),
    #[display("failed to decode image {}: {source}", path.display())]
    #[from(ignore)]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[display("failed to encode image {}: {source}", path.display())]
    #[from(ignore)]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Polygon renderer backed by `tiny-skia`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareRasterizer {
    /// Smooth polygon edges. Turning it off makes every pixel either fully covered
    /// or untouched, which is faster and easier to reason about in tests.
    pub anti_alias: bool,
}

impl Default for SoftwareRasterizer {
    fn default() -> Self {
        Self { anti_alias: true }
    }
}

impl SoftwareRasterizer {
    #[must_use]
    pub fn new(anti_alias: bool) -> Self {
        Self { anti_alias }
    }

    /// Paints `genome` onto a fresh white canvas.
    pub fn render(&self, genome: &Genome, width: u32, height: u32) -> Result<Pixmap, RasterError> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RasterError::CanvasSize { width, height })?;
        pixmap.fill(tiny_skia::Color::WHITE);
        for chromosome in genome.chromosomes() {
            self.paint(&mut pixmap, chromosome);
        }
        Ok(pixmap)
    }

    fn paint(&self, pixmap: &mut Pixmap, chromosome: &Chromosome) {
        let points = chromosome.points();
        let [r, g, b, a] = chromosome.color().to_rgba8();
        if points.len() < 3 || a == 0 {
            return;
        }

        #[expect(clippy::cast_precision_loss)]
        let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
        #[expect(clippy::cast_possible_truncation)]
        let scale = |x: f64, y: f64| (x as f32 * w, y as f32 * h);

        let mut builder = PathBuilder::new();
        let (x, y) = scale(points[0].x, points[0].y);
        builder.move_to(x, y);
        for point in &points[1..] {
            let (x, y) = scale(point.x, point.y);
            builder.line_to(x, y);
        }
        builder.close();
        // zero-area paths have no bounds
        let Some(path) = builder.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = self.anti_alias;
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

impl Rasterizer for SoftwareRasterizer {
    /// # Panics
    ///
    /// Panics if `tiny-skia` cannot allocate a `width × height` canvas. The engine
    /// only asks for the target's dimensions, which are non-zero.
    fn rasterize(&self, genome: &Genome, width: u32, height: u32) -> PixelBuffer {
        self.render(genome, width, height)
            .and_then(|pixmap| to_pixel_buffer(&pixmap))
            .unwrap_or_else(|e| panic!("cannot rasterize genome: {e}"))
    }
}

/// Straight RGBA copy of a premultiplied pixmap.
pub fn to_pixel_buffer(pixmap: &Pixmap) -> Result<PixelBuffer, RasterError> {
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let c = pixel.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Ok(PixelBuffer::new(pixmap.width(), pixmap.height(), data)?)
}

/// Reads an image file (PNG) as straight RGBA.
pub fn load_png(path: impl AsRef<Path>) -> Result<PixelBuffer, RasterError> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|source| RasterError::Decode {
            path: path.to_owned(),
            source,
        })?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Ok(PixelBuffer::new(width, height, image.into_raw())?)
}

/// Writes `buffer` as an RGBA PNG file, alpha unchanged.
pub fn save_png(buffer: &PixelBuffer, path: impl AsRef<Path>) -> Result<(), RasterError> {
    let path = path.as_ref();
    image::save_buffer_with_format(
        path,
        buffer.as_bytes(),
        buffer.width(),
        buffer.height(),
        ExtendedColorType::Rgba8,
        ImageFormat::Png,
    )
    .map_err(|source| RasterError::Encode {
        path: path.to_owned(),
        source,
    })
}
