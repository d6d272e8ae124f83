//! Dataset Builder
//!
//! Turns a batch of raw features into the three derived datasets of a
//! [`DatasetSnapshot`]. Each extraction stage normalizes its features
//! independently; a feature whose geometry cannot be repaired or
//! reprojected is dropped and recorded, while a failure of a whole stage
//! aborts the build.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;
use geo::Polygon;
use serde::Serialize;
use solarscout_core::config::{LayeredConfig, DEFAULT_CANONICAL_SRID, DEFAULT_SOURCE_SRID};
use solarscout_core::error::{Result, SolarscoutError};
use solarscout_core::models::{CandidateParcel, ExclusionCategory, ExclusionZone, GridSegment, RawFeature};
use solarscout_geo::{overlay, Normalizer};

use crate::classify::{candidate_land_use, classify_exclusion, grid_power_type};
use crate::snapshot::DatasetSnapshot;

/// CRS settings the builder normalizes with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderSettings {
    pub canonical_srid: u32,
    pub default_source_srid: u32,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            canonical_srid: DEFAULT_CANONICAL_SRID,
            default_source_srid: DEFAULT_SOURCE_SRID,
        }
    }
}

impl From<&LayeredConfig> for BuilderSettings {
    fn from(config: &LayeredConfig) -> Self {
        Self {
            canonical_srid: config.canonical_srid.value,
            default_source_srid: config.default_source_srid.value,
        }
    }
}

/// A raw feature left out of the snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedFeature {
    pub source_id: String,
    pub stage: String,
    pub reason: String,
}

/// Summary of one build
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RebuildReport {
    pub raw_features: usize,
    pub candidate_parcels: usize,
    /// Raw features that contributed to each dissolved exclusion category
    pub exclusion_features: BTreeMap<ExclusionCategory, usize>,
    pub grid_segments: usize,
    /// Raw features that matched no extraction
    pub unclassified: usize,
    pub dropped: Vec<DroppedFeature>,
}

impl RebuildReport {
    fn drop_feature(&mut self, feature: &RawFeature, stage: &str, error: &SolarscoutError) {
        tracing::warn!(
            feature_id = %feature.source_id,
            stage,
            reason = %error,
            "Dropping raw feature"
        );
        self.dropped.push(DroppedFeature {
            source_id: feature.source_id.clone(),
            stage: stage.to_string(),
            reason: error.to_string(),
        });
    }
}

/// Builds snapshots from raw features
#[derive(Debug, Clone, Default)]
pub struct DatasetBuilder {
    settings: BuilderSettings,
}

impl DatasetBuilder {
    pub fn new(settings: BuilderSettings) -> Self {
        Self { settings }
    }

    /// Build a complete snapshot with the given version.
    ///
    /// Fails with [`SolarscoutError::RebuildFailed`] when any extraction
    /// stage fails as a whole; per-feature failures only land in the report.
    pub fn build(&self, version: u64, features: &[RawFeature]) -> Result<DatasetSnapshot> {
        tracing::info!(
            version,
            raw_features = features.len(),
            canonical_srid = self.settings.canonical_srid,
            "Building dataset snapshot"
        );

        let mut normalizer =
            Normalizer::new(self.settings.canonical_srid, self.settings.default_source_srid);
        let mut report = RebuildReport {
            raw_features: features.len(),
            ..RebuildReport::default()
        };

        let parcels = run_stage("candidates", || {
            extract_candidates(features, &mut normalizer, &mut report)
        })?;
        let exclusions = run_stage("exclusions", || {
            extract_exclusions(features, &mut normalizer, &mut report)
        })?;
        let grid = run_stage("grid", || extract_grid(features, &mut normalizer, &mut report))?;

        report.candidate_parcels = parcels.len();
        report.grid_segments = grid.len();
        report.unclassified = features
            .iter()
            .filter(|feature| {
                candidate_land_use(feature).is_none()
                    && classify_exclusion(feature).is_none()
                    && grid_power_type(feature).is_none()
            })
            .count();

        tracing::info!(
            version,
            candidate_parcels = report.candidate_parcels,
            exclusion_categories = exclusions.len(),
            grid_segments = report.grid_segments,
            dropped = report.dropped.len(),
            "Dataset snapshot built"
        );

        Ok(DatasetSnapshot::new(
            version,
            Utc::now(),
            self.settings.canonical_srid,
            parcels,
            exclusions,
            grid,
            report,
        ))
    }
}

/// Run one extraction stage. A panic in the geometry kernel or an error that
/// is not local to one feature fails the stage.
fn run_stage<T>(stage: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let reason = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "geometry kernel panicked".to_string()),
    };

    tracing::error!(stage, %reason, "Extraction stage failed");
    Err(SolarscoutError::RebuildFailed {
        stage: stage.to_string(),
        reason,
    })
}

/// Record a feature-local error, pass anything else up
fn drop_or_fail(
    report: &mut RebuildReport,
    feature: &RawFeature,
    stage: &str,
    error: SolarscoutError,
) -> Result<()> {
    if error.is_feature_local() {
        report.drop_feature(feature, stage, &error);
        Ok(())
    } else {
        Err(error)
    }
}

fn extract_candidates(
    features: &[RawFeature],
    normalizer: &mut Normalizer,
    report: &mut RebuildReport,
) -> Result<Vec<CandidateParcel>> {
    let mut parcels = Vec::new();

    for feature in features {
        let Some(land_use) = candidate_land_use(feature) else {
            continue;
        };

        match normalizer.normalize_polygonal(&feature.source_id, &feature.geometry, feature.srid) {
            Ok(geometry) => {
                let id = parcels.len() as u64 + 1;
                let name = feature.tag("name").map(str::to_string);
                parcels.push(CandidateParcel::new(id, land_use, name, geometry));
            }
            Err(e) => drop_or_fail(report, feature, "candidates", e)?,
        }
    }

    tracing::info!(count = parcels.len(), "Extracted candidate parcels");
    Ok(parcels)
}

fn extract_exclusions(
    features: &[RawFeature],
    normalizer: &mut Normalizer,
    report: &mut RebuildReport,
) -> Result<Vec<ExclusionZone>> {
    let mut grouped: BTreeMap<ExclusionCategory, Vec<Polygon<f64>>> = BTreeMap::new();

    for feature in features {
        let Some(category) = classify_exclusion(feature) else {
            continue;
        };

        match normalizer.normalize_polygonal(&feature.source_id, &feature.geometry, feature.srid) {
            Ok(geometry) => {
                grouped.entry(category).or_default().extend(geometry.0);
                *report.exclusion_features.entry(category).or_default() += 1;
            }
            Err(e) => drop_or_fail(report, feature, "exclusions", e)?,
        }
    }

    let zones: Vec<ExclusionZone> = grouped
        .into_iter()
        .filter_map(|(category, polygons)| {
            let geometry = overlay::dissolve(&polygons);
            if geometry.0.is_empty() {
                return None;
            }
            tracing::debug!(%category, parts = geometry.0.len(), "Dissolved exclusion category");
            Some(ExclusionZone { category, geometry })
        })
        .collect();

    tracing::info!(categories = zones.len(), "Extracted exclusion zones");
    Ok(zones)
}

fn extract_grid(
    features: &[RawFeature],
    normalizer: &mut Normalizer,
    report: &mut RebuildReport,
) -> Result<Vec<GridSegment>> {
    let mut segments = Vec::new();

    for feature in features {
        let Some(power_type) = grid_power_type(feature) else {
            continue;
        };

        match normalizer.normalize_linear(&feature.source_id, &feature.geometry, feature.srid) {
            Ok(geometry) => segments.push(GridSegment {
                id: segments.len() as u64 + 1,
                power_type: power_type.to_string(),
                name: feature.tag("name").map(str::to_string),
                geometry,
            }),
            Err(e) => drop_or_fail(report, feature, "grid", e)?,
        }
    }

    tracing::info!(count = segments.len(), "Extracted grid segments");
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon, Geometry, Point};

    fn planar_builder() -> DatasetBuilder {
        DatasetBuilder::new(BuilderSettings {
            canonical_srid: 25832,
            default_source_srid: 25832,
        })
    }

    fn square(id: &str, x: f64, y: f64, size: f64) -> RawFeature {
        RawFeature::new(
            id,
            polygon![
                (x: x, y: y),
                (x: x + size, y: y),
                (x: x + size, y: y + size),
                (x: x, y: y + size),
                (x: x, y: y),
            ],
        )
    }

    #[test]
    fn test_extracts_all_three_datasets() {
        let features = vec![
            square("f1", 0.0, 0.0, 100.0).with_tag("landuse", "farmland"),
            square("f2", 200.0, 0.0, 100.0).with_tag("landuse", "meadow").with_tag("name", "Weide"),
            square("r1", 0.0, 200.0, 50.0).with_tag("landuse", "residential"),
            RawFeature::new("g1", line_string![(x: 0.0, y: 500.0), (x: 500.0, y: 500.0)])
                .with_tag("power", "line"),
            square("x1", 900.0, 900.0, 10.0).with_tag("building", "yes"),
        ];

        let snapshot = planar_builder().build(1, &features).unwrap();

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.parcels.len(), 2);
        assert_eq!(snapshot.parcels[0].id, 1);
        assert_eq!(snapshot.parcels[1].id, 2);
        assert_eq!(snapshot.parcels[1].name.as_deref(), Some("Weide"));
        assert_eq!(snapshot.exclusions.len(), 1);
        assert_eq!(snapshot.grid.len(), 1);
        assert_eq!(snapshot.grid[0].power_type, "line");

        let report = &snapshot.report;
        assert_eq!(report.raw_features, 5);
        assert_eq!(report.candidate_parcels, 2);
        assert_eq!(report.exclusion_features.get(&ExclusionCategory::Residential), Some(&1));
        assert_eq!(report.grid_segments, 1);
        assert_eq!(report.unclassified, 1);
        assert!(report.dropped.is_empty());
    }

    #[test]
    fn test_exclusions_are_dissolved_per_category() {
        let features = vec![
            square("w1", 0.0, 0.0, 100.0).with_tag("landuse", "forest"),
            square("w2", 50.0, 0.0, 100.0).with_tag("natural", "wood"),
            square("p1", 500.0, 0.0, 10.0).with_tag("leisure", "park"),
        ];

        let snapshot = planar_builder().build(1, &features).unwrap();

        let woodland = snapshot.exclusion(ExclusionCategory::Woodland).unwrap();
        assert_eq!(woodland.geometry.0.len(), 1);
        assert!((overlay::area_m2(&woodland.geometry) - 15_000.0).abs() < 1e-6);
        assert_eq!(snapshot.report.exclusion_features.get(&ExclusionCategory::Woodland), Some(&2));
        assert!(snapshot.exclusion(ExclusionCategory::Park).is_some());
        assert!(snapshot.exclusion(ExclusionCategory::Water).is_none());
    }

    #[test]
    fn test_invalid_features_are_dropped_and_reported() {
        let features = vec![
            square("good", 0.0, 0.0, 100.0).with_tag("landuse", "farm"),
            RawFeature::new("point", Geometry::Point(Point::new(1.0, 1.0)))
                .with_tag("landuse", "farmland"),
            square("nan", f64::NAN, 0.0, 100.0).with_tag("landuse", "farmland"),
            RawFeature::new("stub", line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 0.0)])
                .with_tag("power", "cable"),
        ];

        let snapshot = planar_builder().build(3, &features).unwrap();

        assert_eq!(snapshot.parcels.len(), 1);
        assert!(snapshot.grid.is_empty());
        let dropped: Vec<_> = snapshot
            .report
            .dropped
            .iter()
            .map(|d| (d.source_id.as_str(), d.stage.as_str()))
            .collect();
        assert_eq!(
            dropped,
            vec![("point", "candidates"), ("nan", "candidates"), ("stub", "grid")]
        );
    }

    #[test]
    fn test_unknown_source_crs_drops_feature() {
        let features = vec![
            square("a", 0.0, 0.0, 100.0).with_tag("landuse", "farmland"),
            square("b", 0.0, 0.0, 100.0)
                .with_tag("landuse", "farmland")
                .with_srid(999_999),
        ];

        let snapshot = planar_builder().build(1, &features).unwrap();

        assert_eq!(snapshot.parcels.len(), 1);
        assert_eq!(snapshot.report.dropped.len(), 1);
        assert_eq!(snapshot.report.dropped[0].source_id, "b");
    }

    #[test]
    fn test_empty_input_builds_empty_snapshot() {
        let snapshot = planar_builder().build(1, &[]).unwrap();
        assert!(snapshot.parcels.is_empty());
        assert!(snapshot.exclusions.is_empty());
        assert!(snapshot.grid.is_empty());
    }

    #[test]
    fn test_stage_error_becomes_rebuild_failure() {
        let result: Result<()> = run_stage("exclusions", || {
            Err(SolarscoutError::Serialization("corrupt buffer".to_string()))
        });
        match result {
            Err(SolarscoutError::RebuildFailed { stage, reason }) => {
                assert_eq!(stage, "exclusions");
                assert!(reason.contains("corrupt buffer"));
            }
            other => panic!("expected RebuildFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_panicking_stage_becomes_rebuild_failure() {
        let result: Result<()> = run_stage("grid", || panic!("kernel blew up"));
        match result {
            Err(SolarscoutError::RebuildFailed { stage, reason }) => {
                assert_eq!(stage, "grid");
                assert!(reason.contains("kernel blew up"));
            }
            other => panic!("expected RebuildFailed, got {other:?}"),
        }
    }
}
