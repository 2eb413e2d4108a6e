use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pixel_sieve::ingest::{UploadPart, sources_from_parts};
use pixel_sieve::{BatchReport, FilterProfile, ParallelPipeline, PipelineConfig, Propagation};
use tracing::{error, info, warn};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Upper bound on the size of one multipart request body.
    pub max_upload_bytes: usize,
    pub pipeline: PipelineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads `SIEVE_BIND`, `SIEVE_MAX_UPLOAD_BYTES`, `SIEVE_MAX_IN_FLIGHT`,
    /// `SIEVE_INDEPENDENT` and `SIEVE_PROPAGATION` (`any` or `matching`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| -> Option<usize> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key, value = %raw, error = %err, "ignoring unparsable setting");
                    None
                }
            }
        };

        let propagation = match lookup("SIEVE_PROPAGATION").as_deref() {
            Some("matching") => Propagation::MatchingClass,
            _ => Propagation::AnyInvalid,
        };
        let independent = matches!(lookup("SIEVE_INDEPENDENT").as_deref(), Some("1" | "true"));
        let profile = if independent {
            FilterProfile::independent()
        } else {
            FilterProfile::contiguous(propagation)
        };

        let mut pipeline = defaults.pipeline.with_profile(profile);
        if let Some(max_in_flight) = parsed("SIEVE_MAX_IN_FLIGHT") {
            pipeline = pipeline.with_max_in_flight(max_in_flight);
        }

        Self {
            bind_addr: lookup("SIEVE_BIND").unwrap_or(defaults.bind_addr),
            max_upload_bytes: parsed("SIEVE_MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            pipeline,
        }
    }
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<ParallelPipeline>,
}

/// Errors answered to the client before any image is analyzed.
#[derive(Debug)]
pub enum UploadError {
    Multipart(MultipartError),
    NoParts,
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::Multipart(err)
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::Multipart(err) => (err.status(), err.to_string()).into_response(),
            UploadError::NoParts => (StatusCode::BAD_REQUEST, "no image parts in upload").into_response(),
        }
    }
}

pub fn router(cfg: &ServerConfig) -> Router {
    let state = AppState {
        pipeline: Arc::new(ParallelPipeline::new(cfg.pipeline)),
    };

    Router::new()
        .route("/", post(analyze_upload))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .with_state(state)
}

async fn analyze_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchReport>, UploadError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let file_name = field.file_name().map(str::to_string);
        let field_name = field.name().map(str::to_string);
        let bytes = field.bytes().await?.to_vec();
        parts.push(UploadPart {
            file_name,
            field_name,
            bytes,
        });
    }

    if parts.is_empty() {
        return Err(UploadError::NoParts);
    }

    info!(parts = parts.len(), "upload received");
    let result = state.pipeline.process_batch(sources_from_parts(parts)).await;
    Ok(Json(result.report()))
}

pub async fn start_server(cfg: ServerConfig) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let app = router(&cfg);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    info!(addr = %listener.local_addr()?, profile = ?cfg.pipeline.profile, "sieve server listening");

    Ok(tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "server stopped");
        }
    }))
}
