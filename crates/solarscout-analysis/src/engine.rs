//! Analysis Engine
//!
//! A pure read over one [`DatasetSnapshot`]: select exclusion categories,
//! buffer and union them into a mask, subtract the mask from every parcel,
//! filter by residual area and grid distance, score and rank. Every
//! intermediate geometry is local to the call.

use std::time::{Duration, Instant};

use geo::{BoundingRect, Geometry, MultiPolygon, Polygon};
use solarscout_core::config::LayeredConfig;
use solarscout_core::error::{Result, SolarscoutError};
use solarscout_core::models::{m2_to_ha, AnalysisConfig, ExclusionCategory, SiteCandidate};
use solarscout_geo::{overlay, SpatialIndex};

use crate::scoring::ScoringPolicy;
use crate::snapshot::DatasetSnapshot;

/// Request-independent analysis settings
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalysisOptions {
    pub scoring: ScoringPolicy,
    /// Time budget for one analysis; `None` runs to completion
    pub timeout: Option<Duration>,
}

impl AnalysisOptions {
    pub fn from_config(config: &LayeredConfig) -> Result<Self> {
        let timeout_ms = config.analysis_timeout_ms.value;
        Ok(Self {
            scoring: ScoringPolicy::from_config(config)?,
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        })
    }
}

/// Cooperative time budget checked between and inside stages
struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    fn new(budget: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    fn check(&self, stage: &str) -> Result<()> {
        match self.budget {
            Some(budget) if self.started.elapsed() >= budget => {
                tracing::warn!(stage, budget_ms = budget.as_millis() as u64, "Analysis timed out");
                Err(SolarscoutError::AnalysisTimeout {
                    stage: stage.to_string(),
                    budget_ms: budget.as_millis() as u64,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Analyze with the default scoring policy and no time budget
pub fn analyze(snapshot: &DatasetSnapshot, config: &AnalysisConfig) -> Result<Vec<SiteCandidate>> {
    analyze_with(snapshot, config, &AnalysisOptions::default())
}

/// Evaluate `config` against `snapshot` and return ranked site candidates.
///
/// An empty result is a valid answer. Running out of time fails the whole
/// request; nothing partial is returned.
pub fn analyze_with(
    snapshot: &DatasetSnapshot,
    config: &AnalysisConfig,
    options: &AnalysisOptions,
) -> Result<Vec<SiteCandidate>> {
    let deadline = Deadline::new(options.timeout);

    let categories = selected_categories(config);
    let mask = exclusion_mask(snapshot, config, &categories, &deadline)?;
    deadline.check("union")?;

    let residuals = subtract_mask(snapshot, &mask, &deadline)?;
    deadline.check("difference")?;

    let mut candidates = Vec::new();
    for (index, residual) in residuals {
        deadline.check("grid_distance")?;

        let parcel = &snapshot.parcels[index];
        let suitable_area_ha = m2_to_ha(overlay::area_m2(&residual)).min(parcel.area_ha);
        if suitable_area_ha <= 0.0 || suitable_area_ha < config.min_area_ha() {
            continue;
        }

        let nearest = snapshot.grid_index().nearest(
            &Geometry::MultiPolygon(residual.clone()),
            Some(config.max_grid_distance_m()),
        );
        let Some(nearest) = nearest else {
            continue;
        };

        candidates.push(SiteCandidate {
            parcel_id: parcel.id,
            geometry: residual,
            original_area_ha: parcel.area_ha,
            suitable_area_ha,
            grid_distance_m: nearest.distance,
            score: options.scoring.score(suitable_area_ha, nearest.distance),
            land_use_category: parcel.land_use_category.clone(),
        });
    }
    deadline.check("scoring")?;

    rank(&mut candidates);

    tracing::info!(
        snapshot_version = snapshot.version,
        buffer_distance_m = config.buffer_distance_m(),
        exclude_nature = config.exclude_nature(),
        min_area_ha = config.min_area_ha(),
        max_grid_distance_m = config.max_grid_distance_m(),
        parcels = snapshot.parcels.len(),
        sites = candidates.len(),
        elapsed_ms = deadline.started.elapsed().as_millis() as u64,
        "Analysis complete"
    );

    Ok(candidates)
}

/// Exclusion categories applied as constraints for this request
fn selected_categories(config: &AnalysisConfig) -> Vec<ExclusionCategory> {
    ExclusionCategory::ALL
        .into_iter()
        .filter(|category| config.exclude_nature() || !category.is_optional())
        .collect()
}

/// Buffer and union every selected exclusion part that can reach a parcel.
///
/// A part whose envelope, grown by the buffer distance, touches no parcel
/// envelope cannot change any residual, so it is never buffered.
fn exclusion_mask(
    snapshot: &DatasetSnapshot,
    config: &AnalysisConfig,
    categories: &[ExclusionCategory],
    deadline: &Deadline,
) -> Result<MultiPolygon<f64>> {
    let buffer_distance = config.buffer_distance_m();

    let mut buffered: Vec<Polygon<f64>> = Vec::new();
    for part in snapshot.exclusion_parts() {
        deadline.check("buffer")?;
        if !categories.contains(&part.category) {
            continue;
        }
        let Some(rect) = part.polygon.bounding_rect() else {
            continue;
        };
        if snapshot.parcel_index().query_rect(&rect, buffer_distance).is_empty() {
            continue;
        }
        let polygon = MultiPolygon::new(vec![part.polygon.clone()]);
        buffered.extend(overlay::buffer(&polygon, buffer_distance).0);
    }

    tracing::debug!(
        categories = categories.len(),
        buffered_parts = buffered.len(),
        "Buffered exclusion parts"
    );

    deadline.check("union")?;
    let mask = overlay::dissolve(&buffered);
    tracing::debug!(mask_parts = mask.0.len(), "Built exclusion mask");
    Ok(mask)
}

/// Residual geometry of every parcel that keeps some area, keyed by its
/// position in the snapshot
fn subtract_mask(
    snapshot: &DatasetSnapshot,
    mask: &MultiPolygon<f64>,
    deadline: &Deadline,
) -> Result<Vec<(usize, MultiPolygon<f64>)>> {
    let mask_index = SpatialIndex::from_geometries(
        mask.0
            .iter()
            .enumerate()
            .map(|(i, polygon)| (i, Geometry::Polygon(polygon.clone())))
            .collect(),
    );

    let mut residuals = Vec::with_capacity(snapshot.parcels.len());
    for (index, parcel) in snapshot.parcels.iter().enumerate() {
        deadline.check("difference")?;

        let Some(rect) = parcel.geometry.bounding_rect() else {
            continue;
        };
        let mut hits: Vec<usize> = mask_index
            .query_rect(&rect, 0.0)
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        hits.sort_unstable();

        let local_mask = MultiPolygon::new(hits.into_iter().map(|i| mask.0[i].clone()).collect());
        let residual = overlay::subtract(&parcel.geometry, &local_mask);
        if !residual.0.is_empty() {
            residuals.push((index, residual));
        }
    }

    tracing::debug!(
        parcels = snapshot.parcels.len(),
        with_residual = residuals.len(),
        "Subtracted exclusion mask"
    );
    Ok(residuals)
}

/// Score descending, then suitable area descending, then parcel id ascending
fn rank(candidates: &mut [SiteCandidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.suitable_area_ha.total_cmp(&a.suitable_area_ha))
            .then(a.parcel_id.cmp(&b.parcel_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuilderSettings, DatasetBuilder};
    use geo::{line_string, polygon};
    use solarscout_core::config::ConfigSource;
    use solarscout_core::models::RawFeature;

    fn rect(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> RawFeature {
        RawFeature::new(
            id,
            polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0)],
        )
    }

    fn build(features: &[RawFeature]) -> DatasetSnapshot {
        DatasetBuilder::new(BuilderSettings {
            canonical_srid: 25832,
            default_source_srid: 25832,
        })
        .build(1, features)
        .unwrap()
    }

    fn candidate(parcel_id: u64, score: f64, area: f64) -> SiteCandidate {
        SiteCandidate {
            parcel_id,
            geometry: MultiPolygon::new(vec![]),
            original_area_ha: area,
            suitable_area_ha: area,
            grid_distance_m: 0.0,
            score,
            land_use_category: "farmland".to_string(),
        }
    }

    #[test]
    fn test_rank_breaks_ties_by_area_then_id() {
        let mut candidates = vec![
            candidate(3, 50.0, 5.0),
            candidate(1, 50.0, 5.0),
            candidate(2, 50.0, 7.0),
            candidate(4, 60.0, 1.0),
        ];
        rank(&mut candidates);
        let order: Vec<u64> = candidates.iter().map(|c| c.parcel_id).collect();
        assert_eq!(order, vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_nature_reserve_is_optional_constraint() {
        let strict = AnalysisConfig::new(0.0, true, 0.1, 2000.0).unwrap();
        let relaxed = AnalysisConfig::new(0.0, false, 0.1, 2000.0).unwrap();
        assert!(selected_categories(&strict).contains(&ExclusionCategory::NatureReserve));
        assert!(!selected_categories(&relaxed).contains(&ExclusionCategory::NatureReserve));
        assert_eq!(selected_categories(&relaxed).len(), ExclusionCategory::ALL.len() - 1);
    }

    #[test]
    fn test_parcel_split_by_exclusion_band_keeps_all_pieces() {
        let snapshot = build(&[
            rect("farm", 0.0, 0.0, 300.0, 100.0).with_tag("landuse", "farmland"),
            rect("water", 100.0, -50.0, 200.0, 150.0).with_tag("natural", "water"),
            RawFeature::new("line", line_string![(x: 0.0, y: 200.0), (x: 300.0, y: 200.0)])
                .with_tag("power", "line"),
        ]);

        let config = AnalysisConfig::new(0.0, true, 0.1, 2000.0).unwrap();
        let sites = analyze(&snapshot, &config).unwrap();

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].geometry.0.len(), 2);
        assert!((sites[0].suitable_area_ha - 2.0).abs() < 1e-6);
        assert!((sites[0].original_area_ha - 3.0).abs() < 1e-6);
        assert!((sites[0].grid_distance_m - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_distant_exclusions_do_not_affect_parcels() {
        let snapshot = build(&[
            rect("farm", 0.0, 0.0, 100.0, 100.0).with_tag("landuse", "farmland"),
            rect("town", 5_000.0, 5_000.0, 6_000.0, 6_000.0).with_tag("landuse", "residential"),
            RawFeature::new("line", line_string![(x: 0.0, y: 150.0), (x: 100.0, y: 150.0)])
                .with_tag("power", "cable"),
        ]);

        let config = AnalysisConfig::new(500.0, true, 0.1, 2000.0).unwrap();
        let sites = analyze(&snapshot, &config).unwrap();

        assert_eq!(sites.len(), 1);
        assert!((sites[0].suitable_area_ha - 1.0).abs() < 1e-9);
        assert_eq!(sites[0].geometry, snapshot.parcels[0].geometry);
    }

    #[test]
    fn test_no_grid_means_no_sites() {
        let snapshot = build(&[rect("farm", 0.0, 0.0, 100.0, 100.0).with_tag("landuse", "farmland")]);
        let config = AnalysisConfig::new(0.0, false, 0.1, 10_000.0).unwrap();
        assert!(analyze(&snapshot, &config).unwrap().is_empty());
    }

    #[test]
    fn test_exhausted_budget_times_out() {
        let snapshot = build(&[rect("farm", 0.0, 0.0, 100.0, 100.0).with_tag("landuse", "farmland")]);
        let config = AnalysisConfig::default();
        let options = AnalysisOptions {
            scoring: ScoringPolicy::default(),
            timeout: Some(Duration::ZERO),
        };

        match analyze_with(&snapshot, &config, &options) {
            Err(SolarscoutError::AnalysisTimeout { budget_ms, .. }) => assert_eq!(budget_ms, 0),
            other => panic!("expected AnalysisTimeout, got {other:?}"),
        }
    }

    #[test]
    fn test_options_from_config() {
        let config = LayeredConfig::with_defaults();
        let options = AnalysisOptions::from_config(&config).unwrap();
        assert_eq!(options.timeout, Some(Duration::from_millis(30_000)));
        assert_eq!(options.scoring, ScoringPolicy::default());
    }

    #[test]
    fn test_zero_timeout_runs_unbounded() {
        let mut config = LayeredConfig::with_defaults();
        config.analysis_timeout_ms.update(0, ConfigSource::File);
        config.validate().unwrap();

        let options = AnalysisOptions::from_config(&config).unwrap();
        assert_eq!(options.timeout, None);
    }
}
