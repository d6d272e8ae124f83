//! Readers that turn interchange files into raw features

pub mod geojson;

pub use self::geojson::{parse_raw_features, GeoJsonFeatureSource};
