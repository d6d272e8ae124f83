use std::sync::Arc;

use solarscout_analysis::{AnalysisOptions, BuilderSettings, SnapshotStore};
use solarscout_core::config::LayeredConfig;
use solarscout_core::error::Result;
use solarscout_core::ports::RawFeatureSource;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub source: Option<Arc<dyn RawFeatureSource>>,
    pub options: AnalysisOptions,
    pub canonical_srid: u32,
    pub output_srid: u32,
}

impl AppState {
    pub fn new(config: &LayeredConfig, source: Option<Arc<dyn RawFeatureSource>>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: Arc::new(SnapshotStore::new(BuilderSettings::from(config))),
            source,
            options: AnalysisOptions::from_config(config)?,
            canonical_srid: config.canonical_srid.value,
            output_srid: config.output_srid.value,
        })
    }
}
