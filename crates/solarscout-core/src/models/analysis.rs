//! Per-request analysis parameters and results.

use geo::MultiPolygon;
use serde::Serialize;

use crate::error::{Result, SolarscoutError};

/// Allowed range for the exclusion buffer, in meters
pub const BUFFER_DISTANCE_RANGE_M: (f64, f64) = (0.0, 2000.0);

/// Smallest usable minimum area, in hectares
pub const MIN_AREA_FLOOR_HA: f64 = 0.1;

/// Allowed range for the maximum grid distance, in meters
pub const MAX_GRID_DISTANCE_RANGE_M: (f64, f64) = (100.0, 10_000.0);

/// Immutable, validated parameters of one analysis request.
///
/// Out-of-range values are clamped into their documented domain; only
/// non-finite numbers are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisConfig {
    buffer_distance_m: f64,
    exclude_nature: bool,
    min_area_ha: f64,
    max_grid_distance_m: f64,
}

impl AnalysisConfig {
    pub fn new(
        buffer_distance_m: f64,
        exclude_nature: bool,
        min_area_ha: f64,
        max_grid_distance_m: f64,
    ) -> Result<Self> {
        let buffer_distance_m = clamp_finite(
            "buffer_distance_m",
            buffer_distance_m,
            BUFFER_DISTANCE_RANGE_M.0,
            BUFFER_DISTANCE_RANGE_M.1,
        )?;
        let min_area_ha = clamp_finite("min_area_ha", min_area_ha, MIN_AREA_FLOOR_HA, f64::MAX)?;
        let max_grid_distance_m = clamp_finite(
            "max_grid_distance_m",
            max_grid_distance_m,
            MAX_GRID_DISTANCE_RANGE_M.0,
            MAX_GRID_DISTANCE_RANGE_M.1,
        )?;

        Ok(Self {
            buffer_distance_m,
            exclude_nature,
            min_area_ha,
            max_grid_distance_m,
        })
    }

    pub fn buffer_distance_m(&self) -> f64 {
        self.buffer_distance_m
    }

    pub fn exclude_nature(&self) -> bool {
        self.exclude_nature
    }

    pub fn min_area_ha(&self) -> f64 {
        self.min_area_ha
    }

    pub fn max_grid_distance_m(&self) -> f64 {
        self.max_grid_distance_m
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            buffer_distance_m: 500.0,
            exclude_nature: true,
            min_area_ha: 2.0,
            max_grid_distance_m: 2000.0,
        }
    }
}

fn clamp_finite(key: &str, value: f64, min: f64, max: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(SolarscoutError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("expected a finite number, got {}", value),
        });
    }

    let clamped = value.clamp(min, max);
    if clamped != value {
        tracing::debug!(key, requested = value, clamped, "Clamped analysis parameter");
    }
    Ok(clamped)
}

/// One ranked parcel of an analysis result.
///
/// `geometry` is the residual geometry left after subtracting exclusions, in
/// the canonical planar CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteCandidate {
    pub parcel_id: u64,
    pub geometry: MultiPolygon<f64>,
    pub original_area_ha: f64,
    pub suitable_area_ha: f64,
    pub grid_distance_m: f64,
    pub score: f64,
    pub land_use_category: String,
}
