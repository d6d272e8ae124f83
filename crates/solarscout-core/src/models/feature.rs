//! Raw geographic features as delivered by the import collaborator.

use std::collections::BTreeMap;

/// Attribute bag of a raw feature (`landuse`, `natural`, `leisure`, ...)
pub type Tags = BTreeMap<String, String>;

/// An externally supplied geographic record.
///
/// The geometry is in whatever CRS the source declared in `srid`; when
/// `srid` is `None` the normalizer assumes its configured default.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub source_id: String,
    pub tags: Tags,
    pub geometry: geo::Geometry<f64>,
    pub srid: Option<u32>,
}

impl RawFeature {
    pub fn new(source_id: impl Into<String>, geometry: impl Into<geo::Geometry<f64>>) -> Self {
        Self {
            source_id: source_id.into(),
            tags: Tags::new(),
            geometry: geometry.into(),
            srid: None,
        }
    }

    /// Add a tag, replacing any previous value for the key
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Declare the CRS the geometry is expressed in
    pub fn with_srid(mut self, srid: u32) -> Self {
        self.srid = Some(srid);
        self
    }

    /// Get a tag value
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Check whether a tag is set to the given value
    pub fn has_tag(&self, key: &str, value: &str) -> bool {
        self.tag(key) == Some(value)
    }
}
