//! Command implementations

mod analyze;
mod inspect;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use solarscout_analysis::{BuilderSettings, DatasetSnapshot, SnapshotStore};
use solarscout_core::config::{CliConfigOverrides, LayeredConfig};
use solarscout_core::formats::GeoJsonFeatureSource;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let output_srid = match &cli.command {
        Commands::Analyze(args) => args.output_srid,
        Commands::Inspect(_) => None,
    };
    let config = load_config(
        cli.config.as_deref(),
        CliConfigOverrides {
            canonical_srid: cli.canonical_srid,
            default_source_srid: cli.source_srid,
            output_srid,
            analysis_timeout_ms: None,
        },
    )?;

    match cli.command {
        Commands::Inspect(args) => inspect::execute(args, &config, &output).await,
        Commands::Analyze(args) => analyze::execute(args, &config, &output).await,
    }
}

/// Defaults, then the optional file, then the environment, then flags
fn load_config(path: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = path {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
    }
    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Read the source file and build a snapshot from it
async fn build_snapshot(source: &Path, config: &LayeredConfig) -> Result<Arc<DatasetSnapshot>> {
    let store = SnapshotStore::new(BuilderSettings::from(config));
    let source = GeoJsonFeatureSource::new(source);
    store
        .rebuild(&source)
        .await
        .with_context(|| format!("Failed to build a snapshot from {}", source.path().display()))
}
