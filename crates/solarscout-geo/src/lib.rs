//! SolarScout Geo - CRS transforms, geometry normalization, overlay and indexing
//!
//! Everything in here works on `geo` types. Polygonal data is always carried
//! as `MultiPolygon` and linear data as `MultiLineString` once normalized.

pub mod index;
pub mod normalize;
pub mod overlay;
pub mod transform;

pub use index::{IndexedGeometry, Nearest, SpatialIndex};
pub use normalize::Normalizer;
pub use transform::CrsTransformer;
