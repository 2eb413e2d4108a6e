use anyhow::Context;
use clap::{Parser, ValueEnum};
use pixel_sieve::ingest::{list_gallery, sources_from_gallery};
use pixel_sieve::report::render_text;
use pixel_sieve::{FilterProfile, ParallelPipeline, PipelineConfig, Propagation};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PropagationArg {
    /// Any invalid neighbor continues the fill
    Any,
    /// Only neighbors of the same invalid class continue the fill
    Matching,
}

impl From<PropagationArg> for Propagation {
    fn from(arg: PropagationArg) -> Self {
        match arg {
            PropagationArg::Any => Propagation::AnyInvalid,
            PropagationArg::Matching => Propagation::MatchingClass,
        }
    }
}

/// Average color of the meaningful pixels of gallery images
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory the image names are resolved in
    #[arg(short, long, env = "SIEVE_GALLERY", default_value = "./gallery")]
    gallery: PathBuf,

    /// Image file names inside the gallery (every readable image when omitted)
    names: Vec<String>,

    /// Reject pure pixels wherever they are instead of only border-connected ones
    #[arg(long)]
    independent: bool,

    /// How the border fill spreads between invalid classes
    #[arg(long, value_enum, default_value = "any")]
    propagation: PropagationArg,

    /// Maximum number of images scanned at the same time
    #[arg(long, env = "SIEVE_MAX_IN_FLIGHT")]
    max_in_flight: Option<usize>,

    /// Print the JSON report instead of text blocks
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let profile = if self.independent {
            FilterProfile::independent()
        } else {
            FilterProfile::contiguous(self.propagation.into())
        };

        let config = PipelineConfig::default().with_profile(profile).with_logging(!self.json);
        match self.max_in_flight {
            Some(max_in_flight) => config.with_max_in_flight(max_in_flight),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config();

    // --- 1. Resolve the batch ---
    let names = if cli.names.is_empty() {
        list_gallery(&cli.gallery)
            .await
            .with_context(|| format!("listing gallery {}", cli.gallery.display()))?
    } else {
        cli.names.clone()
    };
    info!(gallery = %cli.gallery.display(), images = names.len(), "loading gallery");

    // --- 2. Run it ---
    let sources = sources_from_gallery(&cli.gallery, &names).await;
    let result = ParallelPipeline::new(config).process_batch(sources).await;

    // --- 3. Report ---
    if cli.json {
        println!("{}", result.report().to_json()?);
    } else {
        print!("{}", render_text(&result));
    }

    Ok(())
}
