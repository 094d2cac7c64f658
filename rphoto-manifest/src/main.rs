//! rphoto-manifest - race photo manifest synthesis
//!
//! Default command walks the asset tree and writes `manifest.json`.
//! `ingest` merges one vendor adapter's fresh photo list into the cache.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rphoto_common::config::{load_toml_config, ConfigOverrides, Settings};
use rphoto_manifest::services::{CacheStore, FetchError, RefreshOutcome};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for rphoto-manifest
#[derive(Parser, Debug)]
#[command(name = "rphoto-manifest")]
#[command(about = "Build the race photo gallery manifest")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    /// Configuration file (default: ./rphoto.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    /// Asset tree root (default: docs/images)
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge a freshly fetched vendor photo list into a source's cache
    Ingest {
        /// Race name; sanitized into the directory name
        #[arg(long)]
        race: String,

        /// Source (vendor) directory name
        #[arg(long)]
        source: String,

        /// Raw vendor photo list JSON
        #[arg(long)]
        photos: PathBuf,

        /// Raw vendor race metadata JSON
        #[arg(long)]
        race_info: Option<PathBuf>,

        /// Asset tree root (default: docs/images)
        #[arg(long)]
        base_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    let base_dir = match &args.command {
        Some(Command::Ingest { base_dir, .. }) => base_dir.clone(),
        None => args.base_dir.clone(),
    };
    let settings = Settings::resolve(loaded.config, ConfigOverrides { base_dir });

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&settings.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting rphoto-manifest v{} ({} {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );
    match &loaded.source {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: built-in defaults"),
    }
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }

    match args.command {
        None => generate(&settings),
        Some(Command::Ingest {
            race,
            source,
            photos,
            race_info,
            ..
        }) => ingest(&settings, &race, &source, &photos, race_info.as_deref()),
    }
}

fn generate(settings: &Settings) -> Result<()> {
    let manifest = rphoto_manifest::generate_manifest(settings).context("Failed to generate manifest")?;

    info!(
        "Manifest generated: {} race(s), {} photo(s)",
        manifest.races.len(),
        manifest.photo_count()
    );
    info!("Saved to: {}", settings.output.display());
    Ok(())
}

fn ingest(settings: &Settings, race: &str, source: &str, photos: &Path, race_info: Option<&Path>) -> Result<()> {
    let store = CacheStore::new(&settings.base_dir);

    let fresh = read_fetch(photos);
    let outcome = store
        .refresh(race, source, fresh)
        .with_context(|| format!("No photo list available for {}/{}", race, source))?;

    match &outcome {
        RefreshOutcome::Merged { added, total, .. } => {
            info!("Merged photo list: {} new, {} total", added, total)
        }
        RefreshOutcome::Cached { .. } => warn!("Kept cached photo list"),
    }

    if let Some(path) = race_info {
        match read_fetch(path) {
            Ok(info) => {
                let written = store.store_race_info(race, source, &info)?;
                info!("Race info saved to: {}", written.display());
            }
            Err(e) => warn!("Race info not saved: {}", e),
        }
    }

    info!("Source directory: {}", store.source_dir(race, source).display());
    Ok(())
}

/// A vendor adapter's output file, read as a fetch result
fn read_fetch(path: &Path) -> std::result::Result<Value, FetchError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| FetchError::Transport(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|e| FetchError::Parse(format!("{}: {}", path.display(), e)))
}
