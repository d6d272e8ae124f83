//! Derived datasets produced by the dataset builder.

use geo::{Area, MultiLineString, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SolarscoutError;

/// Convert square meters to hectares
pub fn m2_to_ha(area_m2: f64) -> f64 {
    area_m2 / 10_000.0
}

/// Category of an exclusion zone.
///
/// The declaration order is the classification precedence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionCategory {
    Residential,
    Woodland,
    Cemetery,
    Water,
    Park,
    NatureReserve,
}

impl ExclusionCategory {
    pub const ALL: [ExclusionCategory; 6] = [
        ExclusionCategory::Residential,
        ExclusionCategory::Woodland,
        ExclusionCategory::Cemetery,
        ExclusionCategory::Water,
        ExclusionCategory::Park,
        ExclusionCategory::NatureReserve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionCategory::Residential => "residential",
            ExclusionCategory::Woodland => "woodland",
            ExclusionCategory::Cemetery => "cemetery",
            ExclusionCategory::Water => "water",
            ExclusionCategory::Park => "park",
            ExclusionCategory::NatureReserve => "nature_reserve",
        }
    }

    /// Categories that only apply when a request asks to exclude nature
    pub fn is_optional(&self) -> bool {
        matches!(self, ExclusionCategory::NatureReserve)
    }
}

impl fmt::Display for ExclusionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExclusionCategory {
    type Err = SolarscoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExclusionCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| SolarscoutError::ConfigInvalid {
                key: "exclusion_category".to_string(),
                reason: format!("Unknown exclusion category: {}", s),
            })
    }
}

/// Farmland, meadow or farm parcel considered for development
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateParcel {
    pub id: u64,
    pub land_use_category: String,
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
    pub area_m2: f64,
    pub area_ha: f64,
}

impl CandidateParcel {
    /// Create a parcel, deriving its areas from the (canonical, planar) geometry
    pub fn new(
        id: u64,
        land_use_category: impl Into<String>,
        name: Option<String>,
        geometry: MultiPolygon<f64>,
    ) -> Self {
        let area_m2 = geometry.unsigned_area();
        Self {
            id,
            land_use_category: land_use_category.into(),
            name,
            geometry,
            area_m2,
            area_ha: m2_to_ha(area_m2),
        }
    }
}

/// Dissolved geometry of every raw feature mapped to one category
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionZone {
    pub category: ExclusionCategory,
    pub geometry: MultiPolygon<f64>,
}

/// Transmission line or cable
#[derive(Debug, Clone, PartialEq)]
pub struct GridSegment {
    pub id: u64,
    pub power_type: String,
    pub name: Option<String>,
    pub geometry: MultiLineString<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    #[test]
    fn test_parcel_area_in_hectares() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 250.0, y: 0.0),
            (x: 250.0, y: 200.0),
            (x: 0.0, y: 200.0),
            (x: 0.0, y: 0.0),
        ];
        let parcel = CandidateParcel::new(1, "farmland", None, MultiPolygon::new(vec![square]));

        assert!((parcel.area_m2 - 50_000.0).abs() < 1e-6);
        assert!((parcel.area_ha - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_round_trip_through_str() {
        for category in ExclusionCategory::ALL {
            assert_eq!(category.as_str().parse::<ExclusionCategory>().unwrap(), category);
        }
        assert!("farmland".parse::<ExclusionCategory>().is_err());
    }

    #[test]
    fn test_only_nature_reserve_is_optional() {
        let optional: Vec<_> =
            ExclusionCategory::ALL.into_iter().filter(ExclusionCategory::is_optional).collect();
        assert_eq!(optional, vec![ExclusionCategory::NatureReserve]);
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&ExclusionCategory::NatureReserve).unwrap();
        assert_eq!(json, "\"nature_reserve\"");
    }
}
