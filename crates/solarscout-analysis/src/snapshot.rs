//! Versioned dataset snapshots and their publication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use geo::{Geometry, Polygon};
use solarscout_core::error::{Result, SolarscoutError};
use solarscout_core::models::{CandidateParcel, ExclusionCategory, ExclusionZone, GridSegment};
use solarscout_core::ports::RawFeatureSource;
use solarscout_geo::SpatialIndex;
use tokio::sync::Mutex;

use crate::builder::{BuilderSettings, DatasetBuilder, RebuildReport};

/// One polygon of a dissolved exclusion zone
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionPart {
    pub category: ExclusionCategory,
    pub polygon: Polygon<f64>,
}

/// An immutable, internally consistent version of the derived datasets.
///
/// Index ids are positions in the matching vector: `parcels` for the parcel
/// index and `grid` for the grid index.
#[derive(Debug)]
pub struct DatasetSnapshot {
    pub version: u64,
    pub built_at: DateTime<Utc>,
    pub canonical_srid: u32,
    pub parcels: Vec<CandidateParcel>,
    pub exclusions: Vec<ExclusionZone>,
    pub grid: Vec<GridSegment>,
    pub report: RebuildReport,
    exclusion_parts: Vec<ExclusionPart>,
    parcel_index: SpatialIndex,
    grid_index: SpatialIndex,
}

impl DatasetSnapshot {
    pub fn new(
        version: u64,
        built_at: DateTime<Utc>,
        canonical_srid: u32,
        parcels: Vec<CandidateParcel>,
        exclusions: Vec<ExclusionZone>,
        grid: Vec<GridSegment>,
        report: RebuildReport,
    ) -> Self {
        let exclusion_parts: Vec<ExclusionPart> = exclusions
            .iter()
            .flat_map(|zone| {
                zone.geometry.0.iter().map(|polygon| ExclusionPart {
                    category: zone.category,
                    polygon: polygon.clone(),
                })
            })
            .collect();

        let parcel_index = SpatialIndex::from_geometries(
            parcels
                .iter()
                .enumerate()
                .map(|(i, parcel)| (i, Geometry::MultiPolygon(parcel.geometry.clone())))
                .collect(),
        );
        let grid_index = SpatialIndex::from_geometries(
            grid.iter()
                .enumerate()
                .map(|(i, segment)| (i, Geometry::MultiLineString(segment.geometry.clone())))
                .collect(),
        );

        Self {
            version,
            built_at,
            canonical_srid,
            parcels,
            exclusions,
            grid,
            report,
            exclusion_parts,
            parcel_index,
            grid_index,
        }
    }

    /// Dissolved zone of a category, if the dataset has one
    pub fn exclusion(&self, category: ExclusionCategory) -> Option<&ExclusionZone> {
        self.exclusions.iter().find(|zone| zone.category == category)
    }

    pub fn exclusion_parts(&self) -> &[ExclusionPart] {
        &self.exclusion_parts
    }

    pub fn parcel_index(&self) -> &SpatialIndex {
        &self.parcel_index
    }

    pub fn grid_index(&self) -> &SpatialIndex {
        &self.grid_index
    }
}

/// Holds the current snapshot and serializes rebuilds.
///
/// Readers clone the current `Arc` and keep using it for as long as they
/// need; a rebuild publishes its result by replacing that `Arc`, so an
/// in-flight analysis never observes a half-built dataset.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<DatasetSnapshot>>>,
    rebuild_lock: Mutex<()>,
    next_version: AtomicU64,
    builder: DatasetBuilder,
}

impl SnapshotStore {
    pub fn new(settings: BuilderSettings) -> Self {
        Self {
            current: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
            next_version: AtomicU64::new(1),
            builder: DatasetBuilder::new(settings),
        }
    }

    /// Currently published snapshot
    pub fn current(&self) -> Result<Arc<DatasetSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(SolarscoutError::SnapshotUnavailable)
    }

    /// Replace the current snapshot unless it is older than the published one.
    ///
    /// Returns whether `snapshot` became current.
    pub fn publish(&self, snapshot: Arc<DatasetSnapshot>) -> bool {
        let version = snapshot.version;
        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());

        let previous_version = current.as_ref().map(|s| s.version);
        if previous_version.is_some_and(|previous| previous > version) {
            tracing::warn!(version, ?previous_version, "Ignoring stale dataset snapshot");
            return false;
        }

        *current = Some(snapshot);
        drop(current);

        self.next_version.fetch_max(version + 1, Ordering::SeqCst);
        tracing::info!(version, ?previous_version, "Published dataset snapshot");
        true
    }

    /// Rebuild from `source` and publish the result.
    ///
    /// Only one rebuild runs at a time; a concurrent call fails with
    /// [`SolarscoutError::RebuildInProgress`]. On any failure the previously
    /// published snapshot stays current.
    pub async fn rebuild(&self, source: &dyn RawFeatureSource) -> Result<Arc<DatasetSnapshot>> {
        let _guard = self
            .rebuild_lock
            .try_lock()
            .map_err(|_| SolarscoutError::RebuildInProgress)?;

        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        tracing::info!(version, source = %source.describe(), "Starting rebuild");

        let features = source.load().await.map_err(|e| {
            tracing::error!(version, error = %e, "Failed to load raw features");
            SolarscoutError::RebuildFailed {
                stage: "load".to_string(),
                reason: e.to_string(),
            }
        })?;

        let builder = self.builder.clone();
        let snapshot = tokio::task::spawn_blocking(move || builder.build(version, &features))
            .await
            .map_err(|e| SolarscoutError::RebuildFailed {
                stage: "build".to_string(),
                reason: e.to_string(),
            })??;

        let snapshot = Arc::new(snapshot);
        if !self.publish(Arc::clone(&snapshot)) {
            return Err(SolarscoutError::RebuildFailed {
                stage: "publish".to_string(),
                reason: format!("version {} is older than the current snapshot", snapshot.version),
            });
        }
        Ok(snapshot)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(BuilderSettings::default())
    }
}
