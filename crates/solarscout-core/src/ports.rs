//! Port trait definitions
//!
//! Raw features enter the system through [`RawFeatureSource`]; the import of
//! third-party data into such a source happens elsewhere.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RawFeature;

/// Provider of tagged raw geographic features
#[async_trait]
pub trait RawFeatureSource: Send + Sync {
    /// Load every raw feature currently offered by the source
    async fn load(&self) -> Result<Vec<RawFeature>>;

    /// Human-readable description used in logs
    fn describe(&self) -> String;
}

/// In-memory feature source
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureSource {
    features: Vec<RawFeature>,
}

impl MemoryFeatureSource {
    pub fn new(features: Vec<RawFeature>) -> Self {
        Self { features }
    }

    pub fn push(&mut self, feature: RawFeature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[async_trait]
impl RawFeatureSource for MemoryFeatureSource {
    async fn load(&self) -> Result<Vec<RawFeature>> {
        Ok(self.features.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} features)", self.features.len())
    }
}
