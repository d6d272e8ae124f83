use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// SolarScout - solar-farm site suitability analysis
#[derive(Parser, Debug)]
#[command(name = "solarscout")]
#[command(about = "Solar-farm site suitability analysis", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML file with CRS, timeout and scoring settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Planar CRS (EPSG code) all geometry is normalized into
    #[arg(long, global = true)]
    pub canonical_srid: Option<u32>,

    /// CRS (EPSG code) assumed for features that declare none
    #[arg(long, global = true)]
    pub source_srid: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a snapshot from a raw-feature file and report what went into it
    Inspect(InspectArgs),

    /// Run one site suitability analysis
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Raw-feature GeoJSON FeatureCollection
    pub source: PathBuf,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Raw-feature GeoJSON FeatureCollection
    pub source: PathBuf,

    /// Buffer around every exclusion zone in meters (0-2000)
    #[arg(long, default_value_t = 500.0)]
    pub buffer_distance: f64,

    /// Treat nature reserves as exclusion zones
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub exclude_nature: bool,

    /// Minimum remaining area in hectares (at least 0.1)
    #[arg(long, default_value_t = 2.0)]
    pub min_area: f64,

    /// Maximum distance to the grid in meters (100-10000)
    #[arg(long, default_value_t = 2000.0)]
    pub max_grid_distance: f64,

    /// CRS (EPSG code) of the written FeatureCollection
    #[arg(long)]
    pub output_srid: Option<u32>,

    /// Write the ranked FeatureCollection to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}
