use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use solarscout_analysis::{DatasetSnapshot, DroppedFeature};
use solarscout_core::models::ExclusionCategory;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub snapshot_version: u64,
    pub built_at: DateTime<Utc>,
}

impl HealthResponse {
    pub fn ok(snapshot: &DatasetSnapshot) -> Self {
        Self {
            status: "ok".to_string(),
            snapshot_version: snapshot.version,
            built_at: snapshot.built_at,
        }
    }
}

/// Rebuild operation response
#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub version: u64,
    pub built_at: DateTime<Utc>,
    pub candidate_parcels: usize,
    pub exclusion_zones: BTreeMap<ExclusionCategory, usize>,
    pub grid_segments: usize,
    pub dropped: Vec<DroppedFeature>,
}

impl RebuildResponse {
    pub fn from_snapshot(snapshot: &DatasetSnapshot) -> Self {
        Self {
            version: snapshot.version,
            built_at: snapshot.built_at,
            candidate_parcels: snapshot.parcels.len(),
            exclusion_zones: snapshot.report.exclusion_features.clone(),
            grid_segments: snapshot.grid.len(),
            dropped: snapshot.report.dropped.clone(),
        }
    }
}
