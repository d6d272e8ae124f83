//! SolarScout Analysis - dataset builder, snapshot store and site analysis
//!
//! The builder turns raw features into an immutable [`DatasetSnapshot`];
//! the engine evaluates one [`AnalysisConfig`](solarscout_core::models::AnalysisConfig)
//! against a snapshot and the encoder renders the ranked result as GeoJSON.

pub mod builder;
pub mod classify;
pub mod encode;
pub mod engine;
pub mod scoring;
pub mod snapshot;

pub use builder::{BuilderSettings, DatasetBuilder, DroppedFeature, RebuildReport};
pub use encode::ResultEncoder;
pub use engine::{analyze, analyze_with, AnalysisOptions};
pub use scoring::ScoringPolicy;
pub use snapshot::{DatasetSnapshot, ExclusionPart, SnapshotStore};
