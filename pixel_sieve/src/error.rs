use thiserror::Error;

/// Why a single image could not be analyzed. Attached to that image's job;
/// never aborts the batch.
#[derive(Error, Debug)]
pub enum SieveError {
    #[error("{name}: source unavailable: {source}")]
    SourceUnavailable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: unsupported format: {detail}")]
    UnsupportedFormat { name: String, detail: String },

    #[error("{name}: failed to decode image: {source}")]
    DecodeFailure {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("{name}: job aborted: {detail}")]
    JobAborted { name: String, detail: String },
}

impl SieveError {
    /// Name of the image source the error belongs to.
    pub fn name(&self) -> &str {
        match self {
            SieveError::SourceUnavailable { name, .. }
            | SieveError::UnsupportedFormat { name, .. }
            | SieveError::DecodeFailure { name, .. }
            | SieveError::JobAborted { name, .. } => name,
        }
    }

    /// Short machine-readable kind, used by the JSON report.
    pub fn kind(&self) -> &'static str {
        match self {
            SieveError::SourceUnavailable { .. } => "source_unavailable",
            SieveError::UnsupportedFormat { .. } => "unsupported_format",
            SieveError::DecodeFailure { .. } => "decode_failure",
            SieveError::JobAborted { .. } => "job_aborted",
        }
    }
}

pub type Result<T> = std::result::Result<T, SieveError>;
