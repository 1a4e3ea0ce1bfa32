//! roiview-export - core ROI export job
//!
//! Walks every completed review step, translates its core ROIs into
//! whole-slide coordinates and writes per-core JSON point lists plus a
//! per-step CSV summary under the output folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roiview_common::config::{self, TomlConfig};
use roiview_common::db;
use roiview_export::bounds::{BoundsSource, DeepZoomBoundsClient, FixedBounds};
use roiview_export::dump::{run_export, ExportOptions};

/// Command-line arguments for roiview-export
#[derive(Parser, Debug)]
#[command(name = "roiview-export")]
#[command(about = "Export core ROIs of completed review steps as JSON/CSV artifacts")]
#[command(version)]
struct Args {
    /// Destination root for the exported artifacts
    #[arg(long = "output_folder", value_name = "PATH")]
    output_folder: PathBuf,

    /// Skip cores with zero focus regions
    #[arg(long = "exclude_empty_cores")]
    exclude_empty_cores: bool,

    /// Skip steps whose slide evaluation does not mark the slide adequate
    #[arg(long = "exclude_rejected")]
    exclude_rejected: bool,

    /// Keep ROIs in tile-local coordinates (zero offset, no remote calls)
    #[arg(long = "limit-bounds")]
    limit_bounds: bool,

    /// Path of the application database
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Base URL of the deep-zoom image service
    #[arg(long, value_name = "URL")]
    service_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting roiview-export v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml_config = TomlConfig::load();

    let db_path = config::resolve_database_path(args.database.as_deref(), &toml_config);
    info!("Database path: {}", db_path.display());

    let pool = db::connect_readonly(&db_path)
        .await
        .context("Failed to open application database")?;

    let source: Box<dyn BoundsSource> = if args.limit_bounds {
        Box::new(FixedBounds::zero())
    } else {
        let base_url = config::resolve_service_url(args.service_url.as_deref(), &toml_config)
            .context("A deep-zoom service URL is required unless --limit-bounds is set")?;
        info!("Deep-zoom service: {}", base_url);
        Box::new(DeepZoomBoundsClient::new(base_url))
    };

    let opts = ExportOptions {
        out_folder: args.output_folder,
        exclude_empty: args.exclude_empty_cores,
        exclude_rejected: args.exclude_rejected,
    };

    info!("=== Starting core export job ===");
    let stats = run_export(&pool, source.as_ref(), &opts)
        .await
        .context("Export job failed")?;
    info!(
        "=== Export completed: {} steps loaded, {} exported, {} skipped, {} cores written ===",
        stats.steps_loaded, stats.steps_exported, stats.steps_skipped, stats.cores_written
    );

    Ok(())
}
