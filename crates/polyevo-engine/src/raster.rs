//! Pixel buffers and the rasterizer capability.
//!
//! The engine never draws anything itself. It asks a [`Rasterizer`] to turn a
//! [`Genome`] into a [`PixelBuffer`] (the phenotype) and compares that against the
//! target. Any renderer works: a software polygon filler, a GPU backend, or a plain
//! closure in tests.

use crate::genome::Genome;

/// Bytes per pixel (RGBA, one byte per channel).
pub const CHANNELS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PixelBufferError {
    #[display("pixel buffer dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[display("pixel buffer of {width}x{height} needs {expected} bytes, got {actual}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A `width × height` RGBA image with one byte per channel, row-major.
///
/// # Example
///
/// ```
/// use polyevo_engine::raster::PixelBuffer;
///
/// let red = PixelBuffer::filled(4, 4, [255, 0, 0, 255]).unwrap();
/// assert_eq!(red.pixel(3, 3), [255, 0, 0, 255]);
/// assert_eq!(red.as_bytes().len(), 4 * 4 * 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw RGBA bytes, checking that the length matches the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PixelBufferError> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(PixelBufferError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, PixelBufferError> {
        let len = byte_len(width, height)?;
        let data = rgba.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.data.len() / CHANNELS
    }

    /// RGBA of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the buffer.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

fn byte_len(width: u32, height: u32) -> Result<usize, PixelBufferError> {
    if width == 0 || height == 0 {
        return Err(PixelBufferError::EmptyDimensions { width, height });
    }
    Ok(width as usize * height as usize * CHANNELS)
}

/// Turns a genome into pixels.
///
/// Implementations must return a buffer of exactly `width × height`; the fitness
/// evaluator rejects anything else instead of scoring mismatched images.
pub trait Rasterizer {
    fn rasterize(&self, genome: &Genome, width: u32, height: u32) -> PixelBuffer;
}

impl<F> Rasterizer for F
where
    F: Fn(&Genome, u32, u32) -> PixelBuffer,
{
    fn rasterize(&self, genome: &Genome, width: u32, height: u32) -> PixelBuffer {
        self(genome, width, height)
    }
}
