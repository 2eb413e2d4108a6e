// THEORY:
// The `pipeline` module runs the full sieve over one image. It is the unit of
// work the batch layer fans out: one source in, one `ImageJob` out.
//
// Stages:
// 1.  **Decode**: sniff the container from the bytes and decode it. A source that
//     already failed during ingestion, or bytes the decoder rejects, end the job
//     here with an error and no partial result.
// 2.  **Scan**: build the `PixelGrid`.
// 3.  **Filter**: run the flood fill under the batch's `FilterProfile`.
// 4.  **Aggregate**: average the counted pixels.
//
// The elapsed time of a job spans stages 2 to 4 only. Reading and decoding are
// I/O bound and vary with the container, so they are left out for every job
// alike, which keeps the timings of one batch comparable.

use crate::core_modules::aggregator::{FilterOutcome, aggregate};
use crate::core_modules::flood_fill::{FilterProfile, flood_fill};
use crate::core_modules::pixel_grid::PixelGrid;
use crate::error::{Result, SieveError};
use image::{DynamicImage, GenericImageView, ImageError, ImageReader, Rgba};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::{Duration, Instant};
use tracing::debug;

/// Configuration for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// The filtering policy shared, read-only, by every job of the batch.
    pub profile: FilterProfile,
    /// Upper bound on images being scanned at the same time. Each in-flight image
    /// holds a full pixel grid, so this bounds memory as well.
    pub max_in_flight: usize,
    /// Emit one summary record per job once the batch has joined.
    pub logging: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            profile: FilterProfile::default(),
            max_in_flight: num_cpus::get().max(1),
            logging: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_profile(mut self, profile: FilterProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }
}

/// The bytes of one image, or the reason they could not be obtained.
#[derive(Debug)]
pub struct ImageSource {
    name: String,
    payload: Result<Vec<u8>>,
}

impl ImageSource {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload: Ok(bytes),
        }
    }

    /// A source that failed during ingestion. It still becomes a job of the batch.
    pub fn failed(error: SieveError) -> Self {
        Self {
            name: error.name().to_string(),
            payload: Err(error),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_failed(&self) -> bool {
        self.payload.is_err()
    }

    /// The ingestion error, when the source could not be obtained.
    pub fn error(&self) -> Option<&SieveError> {
        self.payload.as_ref().err()
    }
}

/// One image processed end to end. Holds either an outcome or an error, never both.
#[derive(Debug)]
pub struct ImageJob {
    /// File name or upload part name of the source.
    pub name: String,
    /// Width and height, known once the image decoded.
    pub dimensions: Option<(u32, u32)>,
    /// Time spent scanning, filtering and aggregating.
    pub elapsed: Duration,
    pub outcome: Result<FilterOutcome>,
}

impl ImageJob {
    pub fn failed(name: impl Into<String>, error: SieveError) -> Self {
        Self {
            name: name.into(),
            dimensions: None,
            elapsed: Duration::ZERO,
            outcome: Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn result(&self) -> Option<&FilterOutcome> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&SieveError> {
        self.outcome.as_ref().err()
    }
}

/// Decodes `bytes`, sniffing the container from its content.
pub fn decode(name: &str, bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|source| SieveError::SourceUnavailable {
            name: name.to_string(),
            source,
        })?;

    if reader.format().is_none() {
        return Err(SieveError::UnsupportedFormat {
            name: name.to_string(),
            detail: "unrecognized image container".to_string(),
        });
    }

    reader.decode().map_err(|source| match source {
        ImageError::Unsupported(unsupported) => SieveError::UnsupportedFormat {
            name: name.to_string(),
            detail: unsupported.to_string(),
        },
        source => SieveError::DecodeFailure {
            name: name.to_string(),
            source,
        },
    })
}

/// Scan, filter and aggregate a decoded image.
pub fn analyze<I>(image: &I, profile: &FilterProfile) -> FilterOutcome
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let mut grid = PixelGrid::scan(image);
    flood_fill::apply(&mut grid, profile);
    aggregate(&grid)
}

/// Runs one source through every stage and captures the result or the error.
pub fn run_job(source: ImageSource, profile: &FilterProfile) -> ImageJob {
    let ImageSource { name, payload } = source;

    // Stage 1: Decode
    let bytes = match payload {
        Ok(bytes) => bytes,
        Err(error) => return ImageJob::failed(name, error),
    };
    let image = match decode(&name, &bytes) {
        Ok(image) => image,
        Err(error) => return ImageJob::failed(name, error),
    };
    drop(bytes);

    // Stages 2-4: Scan, Filter, Aggregate
    let start = Instant::now();
    let outcome = analyze(&image, profile);
    let elapsed = start.elapsed();

    debug!(
        name = %name,
        width = image.width(),
        height = image.height(),
        valid_pixels = outcome.valid_pixels,
        elapsed_us = elapsed.as_micros() as u64,
        "image analyzed"
    );

    ImageJob {
        name,
        dimensions: Some(image.dimensions()),
        elapsed,
        outcome: Ok(outcome),
    }
}
