//! Result Encoder: ranked site candidates to a GeoJSON FeatureCollection.

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use solarscout_core::error::Result;
use solarscout_core::models::SiteCandidate;
use solarscout_geo::CrsTransformer;

/// Encodes analysis results in the output CRS
#[derive(Debug)]
pub struct ResultEncoder {
    transformer: CrsTransformer,
}

impl ResultEncoder {
    /// Encoder reprojecting from the canonical CRS to `output_srid`
    pub fn new(canonical_srid: u32, output_srid: u32) -> Result<Self> {
        Ok(Self {
            transformer: CrsTransformer::new(canonical_srid, output_srid)?,
        })
    }

    /// Encoder that keeps geometries in `srid`
    pub fn identity(srid: u32) -> Self {
        Self {
            transformer: CrsTransformer::identity(srid),
        }
    }

    /// One feature per candidate, in the given order
    pub fn encode(&self, candidates: &[SiteCandidate]) -> Result<FeatureCollection> {
        let features = candidates
            .iter()
            .map(|candidate| self.encode_candidate(candidate))
            .collect::<Result<Vec<_>>>()?;

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    fn encode_candidate(&self, candidate: &SiteCandidate) -> Result<Feature> {
        let geometry = self.transformer.transform(&candidate.geometry)?;

        let mut properties = JsonObject::new();
        properties.insert("original_area_ha".to_string(), JsonValue::from(candidate.original_area_ha));
        properties.insert("suitable_area_ha".to_string(), JsonValue::from(candidate.suitable_area_ha));
        properties.insert("grid_distance_m".to_string(), JsonValue::from(candidate.grid_distance_m));
        properties.insert("score".to_string(), JsonValue::from(candidate.score));
        properties.insert("landuse".to_string(), JsonValue::from(candidate.land_use_category.as_str()));

        Ok(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
            id: Some(Id::Number(candidate.parcel_id.into())),
            properties: Some(properties),
            foreign_members: None,
        })
    }
}
