//! Composite site score.
//!
//! `score = 100 * (w_a * A / (A + A_ref) + w_d * D_ref / (D_ref + d)) / (w_a + w_d)`
//!
//! `A` is the suitable area in hectares and `d` the grid distance in meters.
//! Both terms lie in `[0, 1]` and equal one half at their reference value,
//! so the weights compare like with like. The score is strictly increasing
//! in area and strictly decreasing in distance whenever the matching
//! weight is positive, and depends on nothing else.

use serde::Serialize;
use solarscout_core::config::LayeredConfig;
use solarscout_core::error::{Result, SolarscoutError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringPolicy {
    area_weight: f64,
    distance_weight: f64,
    area_reference_ha: f64,
    distance_reference_m: f64,
}

impl ScoringPolicy {
    pub fn new(
        area_weight: f64,
        distance_weight: f64,
        area_reference_ha: f64,
        distance_reference_m: f64,
    ) -> Result<Self> {
        let invalid = |key: &str, reason: &str| SolarscoutError::ConfigInvalid {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if !(area_weight.is_finite() && area_weight >= 0.0) {
            return Err(invalid("area_weight", "must be a non-negative number"));
        }
        if !(distance_weight.is_finite() && distance_weight >= 0.0) {
            return Err(invalid("distance_weight", "must be a non-negative number"));
        }
        if area_weight + distance_weight <= 0.0 {
            return Err(invalid("scoring", "at least one weight must be positive"));
        }
        if !(area_reference_ha.is_finite() && area_reference_ha > 0.0) {
            return Err(invalid("area_reference_ha", "must be a positive number"));
        }
        if !(distance_reference_m.is_finite() && distance_reference_m > 0.0) {
            return Err(invalid("distance_reference_m", "must be a positive number"));
        }

        Ok(Self {
            area_weight,
            distance_weight,
            area_reference_ha,
            distance_reference_m,
        })
    }

    pub fn from_config(config: &LayeredConfig) -> Result<Self> {
        Self::new(
            config.area_weight.value,
            config.distance_weight.value,
            config.area_reference_ha.value,
            config.distance_reference_m.value,
        )
    }

    /// Score a site from its suitable area (ha) and grid distance (m)
    pub fn score(&self, suitable_area_ha: f64, grid_distance_m: f64) -> f64 {
        let area = suitable_area_ha.max(0.0);
        let distance = grid_distance_m.max(0.0);

        let area_term = area / (area + self.area_reference_ha);
        let distance_term = self.distance_reference_m / (self.distance_reference_m + distance);

        100.0 * (self.area_weight * area_term + self.distance_weight * distance_term)
            / (self.area_weight + self.distance_weight)
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            area_weight: 0.6,
            distance_weight: 0.4,
            area_reference_ha: 10.0,
            distance_reference_m: 1000.0,
        }
    }
}
