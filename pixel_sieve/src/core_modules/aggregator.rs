// THEORY:
// The `aggregator` summarizes a filtered grid. It sums the four channels of
// every pixel the filter did not reject and divides by their count.
//
// An image can legitimately end up with no counted pixel at all (an all-white
// scan, a fully transparent sprite). That is a data outcome, not a fault: the
// average is reported as `ColorAverage::NoValidPixels` instead of dividing by
// zero.

use crate::core_modules::pixel::pixel::CHANNELS;
use crate::core_modules::pixel_grid::PixelGrid;
use serde::{Deserialize, Serialize};

pub type ChannelSums = [u64; CHANNELS];
pub type ChannelAverages = [f64; CHANNELS];

/// Per-channel average of the counted pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorAverage {
    Rgba(ChannelAverages),
    NoValidPixels,
}

impl ColorAverage {
    pub fn from_sums(sums: &ChannelSums, count: u64) -> Self {
        if count == 0 {
            return ColorAverage::NoValidPixels;
        }
        ColorAverage::Rgba(sums.map(|sum| sum as f64 / count as f64))
    }

    pub fn channels(&self) -> Option<ChannelAverages> {
        match self {
            ColorAverage::Rgba(channels) => Some(*channels),
            ColorAverage::NoValidPixels => None,
        }
    }

    /// Averages rounded to the nearest integer per channel.
    pub fn rounded(&self) -> Option<[u8; CHANNELS]> {
        self.channels()
            .map(|channels| channels.map(|value| value.round().clamp(0.0, 255.0) as u8))
    }
}

/// The result of aggregating one filtered image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    /// Number of pixels that took part in the average.
    pub valid_pixels: u64,
    /// Per-channel (R, G, B, A) sums over the counted pixels.
    pub sums: ChannelSums,
    pub average: ColorAverage,
}

impl FilterOutcome {
    pub fn has_valid_pixels(&self) -> bool {
        self.valid_pixels > 0
    }
}

/// Sums and averages every pixel of `grid` that was not rejected.
pub fn aggregate(grid: &PixelGrid) -> FilterOutcome {
    let mut sums: ChannelSums = [0; CHANNELS];
    let mut valid_pixels = 0u64;

    for pixel in grid.pixels().iter().filter(|pixel| pixel.counts()) {
        valid_pixels += 1;
        for (sum, channel) in sums.iter_mut().zip(pixel.rgba()) {
            *sum += channel as u64;
        }
    }

    FilterOutcome {
        valid_pixels,
        sums,
        average: ColorAverage::from_sums(&sums, valid_pixels),
    }
}
