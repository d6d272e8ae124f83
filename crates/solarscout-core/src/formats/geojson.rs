//! GeoJSON raw-feature reader

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use crate::error::{Result, SolarscoutError};
use crate::models::{RawFeature, Tags};
use crate::ports::RawFeatureSource;

/// Raw features stored as a GeoJSON FeatureCollection on disk
#[derive(Debug, Clone)]
pub struct GeoJsonFeatureSource {
    path: PathBuf,
}

impl GeoJsonFeatureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RawFeatureSource for GeoJsonFeatureSource {
    async fn load(&self) -> Result<Vec<RawFeature>> {
        let content =
            tokio::fs::read_to_string(&self.path).await.map_err(|e| SolarscoutError::SourceRead {
                reason: format!("{}: {}", self.path.display(), e),
            })?;

        parse_raw_features(&content)
    }

    fn describe(&self) -> String {
        format!("geojson ({})", self.path.display())
    }
}

/// Parse GeoJSON text into raw features.
///
/// Properties become tags. The CRS comes from a per-feature `srid` member,
/// else from the collection's `crs` member, else it is left unset.
/// Features without a usable geometry are skipped with a warning.
pub fn parse_raw_features(content: &str) -> Result<Vec<RawFeature>> {
    let geojson: geojson::GeoJson = content.parse().map_err(|e| SolarscoutError::SourceRead {
        reason: format!("Failed to parse GeoJSON: {}", e),
    })?;

    let features = match geojson {
        geojson::GeoJson::FeatureCollection(fc) => {
            let collection_srid = fc
                .foreign_members
                .as_ref()
                .and_then(|fm| fm.get("crs"))
                .and_then(extract_epsg_from_crs);

            fc.features
                .into_iter()
                .enumerate()
                .filter_map(|(idx, feature)| convert_feature(feature, idx, collection_srid))
                .collect()
        }
        geojson::GeoJson::Feature(feature) => {
            convert_feature(feature, 0, None).into_iter().collect()
        }
        geojson::GeoJson::Geometry(geometry) => {
            let geometry = geo::Geometry::<f64>::try_from(geometry).map_err(|e| {
                SolarscoutError::SourceRead {
                    reason: format!("Unsupported geometry: {}", e),
                }
            })?;
            vec![RawFeature::new("0", geometry)]
        }
    };

    Ok(features)
}

fn convert_feature(
    feature: geojson::Feature,
    idx: usize,
    collection_srid: Option<u32>,
) -> Option<RawFeature> {
    let source_id = feature
        .id
        .as_ref()
        .map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        })
        .unwrap_or_else(|| idx.to_string());

    let Some(geometry) = feature.geometry else {
        tracing::warn!(feature_id = %source_id, "Skipping feature without geometry");
        return None;
    };

    let geometry = match geo::Geometry::<f64>::try_from(geometry) {
        Ok(geometry) => geometry,
        Err(e) => {
            tracing::warn!(feature_id = %source_id, error = %e, "Skipping unreadable geometry");
            return None;
        }
    };

    let tags: Tags = feature
        .properties
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            JsonValue::Null => None,
            JsonValue::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect();

    let srid = feature
        .foreign_members
        .as_ref()
        .and_then(|fm| fm.get("srid"))
        .and_then(JsonValue::as_u64)
        .and_then(|srid| u32::try_from(srid).ok())
        .or(collection_srid);

    Some(RawFeature {
        source_id,
        tags,
        geometry,
        srid,
    })
}

/// Extract EPSG code from a legacy GeoJSON `crs` object
fn extract_epsg_from_crs(crs: &JsonValue) -> Option<u32> {
    let name = crs.get("properties")?.get("name")?.as_str()?;

    // "EPSG:4326", "urn:ogc:def:crs:EPSG::4326" or "urn:ogc:def:crs:OGC:1.3:CRS84"
    let code = name.rsplit(':').next()?;
    if code.eq_ignore_ascii_case("CRS84") {
        return Some(4326);
    }
    code.parse().ok()
}
