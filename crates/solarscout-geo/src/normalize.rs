//! Geometry normalization: dimension extraction, reprojection and repair

use geo::algorithm::orient::{Direction, Orient};
use geo::{
    unary_union, Area, CoordsIter, Geometry, LineString, MultiLineString, MultiPolygon, Polygon,
    RemoveRepeatedPoints, Validation,
};
use solarscout_core::error::{Result, SolarscoutError};
use std::collections::HashMap;

use crate::transform::CrsTransformer;

/// Brings raw geometries into the canonical planar CRS as valid multi-part
/// geometries.
///
/// Transformers are created lazily per source CRS and cached, including
/// failures, so a batch with many features in an unsupported CRS only asks
/// PROJ once.
pub struct Normalizer {
    canonical_srid: u32,
    default_source_srid: u32,
    transformers: HashMap<u32, std::result::Result<CrsTransformer, String>>,
}

impl Normalizer {
    pub fn new(canonical_srid: u32, default_source_srid: u32) -> Self {
        Self {
            canonical_srid,
            default_source_srid,
            transformers: HashMap::new(),
        }
    }

    /// CRS assumed for a geometry: the declared one, or the default when unset
    pub fn source_srid(&self, declared_srid: Option<u32>) -> u32 {
        match declared_srid {
            Some(srid) if srid != 0 => srid,
            _ => self.default_source_srid,
        }
    }

    /// Normalize to a valid, non-empty canonical `MultiPolygon`.
    ///
    /// Non-polygonal parts of collections are discarded.
    pub fn normalize_polygonal(
        &mut self,
        feature_id: &str,
        geometry: &Geometry<f64>,
        declared_srid: Option<u32>,
    ) -> Result<MultiPolygon<f64>> {
        let polygons = extract_polygons(geometry);
        if polygons.0.is_empty() {
            return Err(SolarscoutError::EmptyGeometry {
                feature_id: feature_id.to_string(),
            });
        }
        ensure_finite(feature_id, &polygons)?;

        let projected = self.reproject(feature_id, &polygons, declared_srid)?;
        let repaired = repair_polygons(projected);
        if repaired.0.is_empty() {
            return Err(SolarscoutError::EmptyGeometry {
                feature_id: feature_id.to_string(),
            });
        }

        Ok(repaired)
    }

    /// Normalize to a non-empty canonical `MultiLineString`.
    ///
    /// Non-linear parts of collections are discarded.
    pub fn normalize_linear(
        &mut self,
        feature_id: &str,
        geometry: &Geometry<f64>,
        declared_srid: Option<u32>,
    ) -> Result<MultiLineString<f64>> {
        let lines = extract_lines(geometry);
        if lines.0.is_empty() {
            return Err(SolarscoutError::EmptyGeometry {
                feature_id: feature_id.to_string(),
            });
        }
        ensure_finite(feature_id, &lines)?;

        let projected = self.reproject(feature_id, &lines, declared_srid)?;
        let repaired = repair_lines(projected);
        if repaired.0.is_empty() {
            return Err(SolarscoutError::EmptyGeometry {
                feature_id: feature_id.to_string(),
            });
        }

        Ok(repaired)
    }

    fn reproject<G>(&mut self, feature_id: &str, geometry: &G, declared_srid: Option<u32>) -> Result<G>
    where
        G: geo::MapCoords<f64, f64, Output = G> + CoordsIter<Scalar = f64> + Clone,
    {
        let source_srid = self.source_srid(declared_srid);
        let canonical_srid = self.canonical_srid;

        let transformer = self
            .transformers
            .entry(source_srid)
            .or_insert_with(|| {
                CrsTransformer::new(source_srid, canonical_srid).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|reason| SolarscoutError::Projection {
                from_srid: source_srid,
                to_srid: canonical_srid,
                reason: reason.clone(),
            })?;

        let projected = transformer.transform(geometry)?;
        if !is_finite(&projected) {
            tracing::debug!(feature_id, source_srid, "Projection produced non-finite coordinates");
            return Err(SolarscoutError::Projection {
                from_srid: source_srid,
                to_srid: canonical_srid,
                reason: format!("feature {} lies outside the projection domain", feature_id),
            });
        }

        Ok(projected)
    }
}

/// Collect the polygonal parts of any geometry
pub fn extract_polygons(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    let mut polygons = Vec::new();
    collect_polygons(geometry, &mut polygons);
    MultiPolygon::new(polygons)
}

fn collect_polygons(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(polygon) => out.push(polygon.clone()),
        Geometry::MultiPolygon(multi) => out.extend(multi.0.iter().cloned()),
        Geometry::Rect(rect) => out.push(rect.to_polygon()),
        Geometry::Triangle(triangle) => out.push(triangle.to_polygon()),
        Geometry::GeometryCollection(collection) => {
            for member in collection.iter() {
                collect_polygons(member, out);
            }
        }
        _ => {}
    }
}

/// Collect the linear parts of any geometry
pub fn extract_lines(geometry: &Geometry<f64>) -> MultiLineString<f64> {
    let mut lines = Vec::new();
    collect_lines(geometry, &mut lines);
    MultiLineString::new(lines)
}

fn collect_lines(geometry: &Geometry<f64>, out: &mut Vec<LineString<f64>>) {
    match geometry {
        Geometry::Line(line) => out.push(LineString::new(vec![line.start, line.end])),
        Geometry::LineString(line_string) => out.push(line_string.clone()),
        Geometry::MultiLineString(multi) => out.extend(multi.0.iter().cloned()),
        Geometry::GeometryCollection(collection) => {
            for member in collection.iter() {
                collect_lines(member, out);
            }
        }
        _ => {}
    }
}

/// Repair polygonal geometry.
///
/// Rings are oriented (exterior counter-clockwise, holes clockwise). If the
/// result is still invalid (self-intersections, overlapping parts) it is
/// re-noded through a unary union. Degenerate and zero-area parts are
/// dropped. Valid, oriented input comes back unchanged.
pub fn repair_polygons(polygons: MultiPolygon<f64>) -> MultiPolygon<f64> {
    let rings_ok: Vec<Polygon<f64>> =
        polygons.into_iter().filter(|polygon| polygon.exterior().0.len() >= 4).collect();

    let oriented = MultiPolygon::new(rings_ok).orient(Direction::Default);
    let repaired = if oriented.is_valid() {
        oriented
    } else {
        unary_union(&oriented.0)
    };

    drop_degenerate(repaired)
}

/// Remove parts without area
pub fn drop_degenerate(polygons: MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(
        polygons
            .into_iter()
            .filter(|polygon| polygon.exterior().0.len() >= 4 && polygon.unsigned_area() > 0.0)
            .collect(),
    )
}

/// Repair linear geometry: drop repeated vertices and lines shorter than two vertices
pub fn repair_lines(lines: MultiLineString<f64>) -> MultiLineString<f64> {
    MultiLineString::new(
        lines
            .into_iter()
            .map(|line| line.remove_repeated_points())
            .filter(|line| line.0.len() >= 2)
            .collect(),
    )
}

fn is_finite<G: CoordsIter<Scalar = f64>>(geometry: &G) -> bool {
    geometry.coords_iter().all(|coord| coord.x.is_finite() && coord.y.is_finite())
}

fn ensure_finite<G: CoordsIter<Scalar = f64>>(feature_id: &str, geometry: &G) -> Result<()> {
    if is_finite(geometry) {
        Ok(())
    } else {
        Err(SolarscoutError::InvalidGeometry {
            feature_id: feature_id.to_string(),
            reason: "Coordinates must be finite".to_string(),
        })
    }
}
