//! Polygon overlay primitives: buffer, dissolve, difference

use geo::{unary_union, Area, BooleanOps, Buffer, MultiPolygon, Polygon};

use crate::normalize::drop_degenerate;

/// Expand polygons outward by `distance` meters.
///
/// A distance of zero (or less) returns the input unchanged.
pub fn buffer(geometry: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if distance <= 0.0 || geometry.0.is_empty() {
        return geometry.clone();
    }
    drop_degenerate(geometry.buffer(distance))
}

/// Union all parts into one polygonal geometry without internal boundaries
pub fn dissolve<'a>(parts: impl IntoIterator<Item = &'a Polygon<f64>>) -> MultiPolygon<f64> {
    drop_degenerate(unary_union(parts))
}

/// Subtract `mask` from `geometry`.
///
/// An empty mask is the identity. The overlay output is cleaned of
/// zero-area slivers so only polygonal residue remains.
pub fn subtract(geometry: &MultiPolygon<f64>, mask: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if mask.0.is_empty() {
        return geometry.clone();
    }
    drop_degenerate(geometry.difference(mask))
}

/// Planar area in square meters
pub fn area_m2(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.unsigned_area()
}
