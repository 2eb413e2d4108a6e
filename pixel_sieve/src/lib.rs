// THEORY:
// This file is the main entry point for the `pixel_sieve` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (the `sieve_cli` runner and the
// `sieve_server` upload service).
//
// The primary goal is to export the `ParallelPipeline` and its associated data
// structures (`PipelineConfig`, `FilterProfile`, `ImageJob`, `BatchResult`, the
// report model) as the high-level interface of the sieve. The per-pixel engine
// (`core_modules`) stays public for callers that already hold a decoded image and
// want to scan, filter and aggregate it themselves.

pub mod core_modules;
pub mod error;
pub mod ingest;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod report;

pub use core_modules::aggregator::{ColorAverage, FilterOutcome};
pub use core_modules::flood_fill::{FilterProfile, Propagation};
pub use core_modules::pixel_grid::PixelGrid;
pub use error::{Result, SieveError};
pub use parallel_pipeline::{BatchResult, ParallelPipeline};
pub use pipeline::{ImageJob, ImageSource, PipelineConfig};
pub use report::{BatchReport, JobSummary};
