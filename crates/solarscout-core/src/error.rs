//! Error types for SolarScout

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolarscoutError {
    // Geometry errors (per feature, recovered during a rebuild)
    #[error("Invalid geometry at feature {feature_id}: {reason}")]
    InvalidGeometry { feature_id: String, reason: String },

    #[error("Geometry of feature {feature_id} is empty after normalization")]
    EmptyGeometry { feature_id: String },

    #[error("Cannot project from EPSG:{from_srid} to EPSG:{to_srid}: {reason}")]
    Projection {
        from_srid: u32,
        to_srid: u32,
        reason: String,
    },

    // Dataset errors
    #[error("Rebuild failed during {stage}: {reason}")]
    RebuildFailed { stage: String, reason: String },

    #[error("A rebuild is already in progress")]
    RebuildInProgress,

    #[error("No dataset snapshot available. Run a rebuild first")]
    SnapshotUnavailable,

    #[error("Failed to read raw features: {reason}")]
    SourceRead { reason: String },

    // Analysis errors
    #[error("Analysis exceeded its {budget_ms} ms budget during {stage}")]
    AnalysisTimeout { stage: String, budget_ms: u64 },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SolarscoutError {
    /// Whether this error only affects a single raw feature.
    ///
    /// Such errors are logged and the feature is skipped; the rebuild goes on.
    pub fn is_feature_local(&self) -> bool {
        matches!(
            self,
            SolarscoutError::InvalidGeometry { .. }
                | SolarscoutError::EmptyGeometry { .. }
                | SolarscoutError::Projection { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SolarscoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_local_errors() {
        let geometry = SolarscoutError::InvalidGeometry {
            feature_id: "way/1".to_string(),
            reason: "Coordinates must be finite".to_string(),
        };
        let projection = SolarscoutError::Projection {
            from_srid: 9999,
            to_srid: 25832,
            reason: "unknown crs".to_string(),
        };

        assert!(geometry.is_feature_local());
        assert!(projection.is_feature_local());
        assert!(!SolarscoutError::RebuildInProgress.is_feature_local());
        assert!(!SolarscoutError::SnapshotUnavailable.is_feature_local());
    }

    #[test]
    fn test_timeout_message_names_stage() {
        let err = SolarscoutError::AnalysisTimeout {
            stage: "union".to_string(),
            budget_ms: 250,
        };
        assert_eq!(err.to_string(), "Analysis exceeded its 250 ms budget during union");
    }
}
