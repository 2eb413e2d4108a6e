// THEORY:
// The `PixelGrid` is the owner of every `Pixel` of one image. It performs the
// first step of the sieve: transforming a decoded image into a spatially
// organized, row-major grid of classified pixels that the flood fill can walk.
//
// Key architectural principles:
// 1.  **Single Owner**: A grid belongs to exactly one job. It is built, filtered
//     and aggregated inside that job and dropped with it.
// 2.  **Flat Storage**: Pixels live in one `Vec` indexed by `y * width + x`. The
//     flood fill works on these indices, which keeps its worklist small and
//     free of borrows into the grid.
// 3.  **Fresh Scans**: `scan` always builds a new grid, so re-scanning an image
//     discards any state a previous filter pass left behind.

use crate::core_modules::pixel::pixel::{Byte, CHANNELS, Coordinate, Pixel};
use image::{GenericImageView, Rgba};

/// A width x height grid of classified pixels, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Visits every coordinate of `image` exactly once and classifies it.
    pub fn scan<I>(image: &I) -> Self
    where
        I: GenericImageView<Pixel = Rgba<Byte>>,
    {
        let (width, height) = image.dimensions();
        let mut pixels = Vec::with_capacity(width as usize * height as usize);

        for y in 0..height {
            for x in 0..width {
                pixels.push(Pixel::from((x, y, image.get_pixel(x, y))));
            }
        }

        Self {
            width,
            height,
            pixels,
        }
    }

    /// Builds a grid from a raw RGBA8 buffer. Returns `None` when the buffer
    /// length does not match the dimensions.
    pub fn from_rgba_bytes(width: u32, height: u32, buffer: &[Byte]) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(CHANNELS)?;
        if buffer.len() != expected {
            return None;
        }

        let pixels = buffer
            .chunks_exact(CHANNELS)
            .enumerate()
            .map(|(i, bytes)| {
                let x = (i % width as usize) as Coordinate;
                let y = (i / width as usize) as Coordinate;
                Pixel::new(x, y, [bytes[0], bytes[1], bytes[2], bytes[3]])
            })
            .collect();

        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn index_of(&self, x: Coordinate, y: Coordinate) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, x: Coordinate, y: Coordinate) -> Option<&Pixel> {
        self.index_of(x, y).map(|index| &self.pixels[index])
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Indices of the outer ring: first and last row, first and last column.
    /// Corners are listed once; single-row or single-column grids list each cell once.
    pub fn border_indices(&self) -> Vec<usize> {
        if self.is_empty() {
            return Vec::new();
        }

        let width = self.width as usize;
        let height = self.height as usize;
        let mut border = Vec::with_capacity(2 * (width + height));

        border.extend(0..width);
        if height > 1 {
            border.extend((height - 1) * width..height * width);
        }
        for y in 1..height.saturating_sub(1) {
            border.push(y * width);
            if width > 1 {
                border.push(y * width + width - 1);
            }
        }

        border
    }

    /// The up-to-4 orthogonal neighbors of `index` (left, right, up, down).
    pub fn neighbors(&self, index: usize) -> [Option<usize>; 4] {
        let width = self.width as usize;
        let height = self.height as usize;
        let x = index % width;
        let y = index / width;

        [
            (x > 0).then(|| index - 1),
            (x + 1 < width).then(|| index + 1),
            (y > 0).then(|| index - width),
            (y + 1 < height).then(|| index + width),
        ]
    }
}
