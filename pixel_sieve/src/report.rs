// Rendering of a joined batch: one structured log record per job, the
// human-readable block format, and a serde model for JSON output.

use crate::core_modules::aggregator::ChannelAverages;
use crate::parallel_pipeline::BatchResult;
use crate::pipeline::ImageJob;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::{error, info};

/// The reportable fields of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub name: String,
    pub ok: bool,
    pub elapsed_ms: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Exact per-channel averages. `None` when the job failed or kept no pixel.
    pub average: Option<ChannelAverages>,
    /// Averages rounded to the nearest integer per channel.
    pub rounded: Option<[u8; 4]>,
    pub valid_pixels: Option<u64>,
    pub error_kind: Option<String>,
    pub error: Option<String>,
}

impl From<&ImageJob> for JobSummary {
    fn from(job: &ImageJob) -> Self {
        let outcome = job.result();
        let error = job.error();
        Self {
            name: job.name.clone(),
            ok: job.is_ok(),
            elapsed_ms: job.elapsed.as_micros() as f64 / 1000.0,
            width: job.dimensions.map(|(width, _)| width),
            height: job.dimensions.map(|(_, height)| height),
            average: outcome.and_then(|o| o.average.channels()),
            rounded: outcome.and_then(|o| o.average.rounded()),
            valid_pixels: outcome.map(|o| o.valid_pixels),
            error_kind: error.map(|e| e.kind().to_string()),
            error: error.map(|e| e.to_string()),
        }
    }
}

/// A serializable view of a whole batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub jobs: Vec<JobSummary>,
}

impl From<&BatchResult> for BatchReport {
    fn from(result: &BatchResult) -> Self {
        Self {
            succeeded: result.succeeded(),
            failed: result.failed(),
            jobs: result.iter().map(JobSummary::from).collect(),
        }
    }
}

impl BatchReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Emits one summary record per job.
pub fn log_batch(result: &BatchResult) {
    for job in result.iter() {
        match (&job.outcome, job.dimensions) {
            (Ok(outcome), dimensions) => {
                let (width, height) = dimensions.unwrap_or_default();
                info!(
                    name = %job.name,
                    elapsed = ?job.elapsed,
                    width,
                    height,
                    average = ?outcome.average.rounded(),
                    valid_pixels = outcome.valid_pixels,
                    "image summary"
                );
            }
            (Err(err), _) => {
                error!(name = %job.name, error = %err, "image summary");
            }
        }
    }
}

/// Renders the batch as text blocks, one per job:
///
/// ```text
/// -----apple.jpg-----
/// Elapsed: 1.2ms
/// Image size: 640 x 480
/// Average RGBA: 182 41 37 255
/// Valid pixels: 120443
/// ```
pub fn render_text(result: &BatchResult) -> String {
    let mut text = String::new();
    for job in result.iter() {
        let _ = writeln!(text, "-----{}-----", job.name);
        match &job.outcome {
            Ok(outcome) => {
                let (width, height) = job.dimensions.unwrap_or_default();
                let _ = writeln!(text, "Elapsed: {:?}", job.elapsed);
                let _ = writeln!(text, "Image size: {} x {}", width, height);
                match outcome.average.rounded() {
                    Some([r, g, b, a]) => {
                        let _ = writeln!(text, "Average RGBA: {} {} {} {}", r, g, b, a);
                    }
                    None => {
                        let _ = writeln!(text, "Average RGBA: no valid pixels");
                    }
                }
                let _ = writeln!(text, "Valid pixels: {}", outcome.valid_pixels);
            }
            Err(err) => {
                let _ = writeln!(text, "ERROR: {}", err);
            }
        }
        text.push('\n');
    }
    text
}
