use serde::Deserialize;
use solarscout_core::error::Result;
use solarscout_core::models::AnalysisConfig;

/// Analyze request body; every field is optional
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default = "default_buffer_distance", alias = "buffer_distance")]
    pub buffer_distance_m: f64,
    #[serde(default = "default_exclude_nature")]
    pub exclude_nature: bool,
    #[serde(default = "default_min_area", alias = "min_area")]
    pub min_area_ha: f64,
    #[serde(default = "default_max_grid_distance", alias = "max_grid_distance")]
    pub max_grid_distance_m: f64,
}

impl Default for AnalyzeRequest {
    fn default() -> Self {
        Self {
            buffer_distance_m: default_buffer_distance(),
            exclude_nature: default_exclude_nature(),
            min_area_ha: default_min_area(),
            max_grid_distance_m: default_max_grid_distance(),
        }
    }
}

impl AnalyzeRequest {
    /// Clamp into a validated analysis config
    pub fn to_config(&self) -> Result<AnalysisConfig> {
        AnalysisConfig::new(
            self.buffer_distance_m,
            self.exclude_nature,
            self.min_area_ha,
            self.max_grid_distance_m,
        )
    }
}

fn default_buffer_distance() -> f64 {
    500.0
}

fn default_exclude_nature() -> bool {
    true
}

fn default_min_area() -> f64 {
    2.0
}

fn default_max_grid_distance() -> f64 {
    2000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_uses_defaults() {
        let request: AnalyzeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, AnalyzeRequest::default());
        assert_eq!(request.to_config().unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn test_short_field_names_are_accepted() {
        let request: AnalyzeRequest = serde_json::from_str(
            r#"{"buffer_distance": 100, "exclude_nature": false, "min_area": 3.5, "max_grid_distance": 1500}"#,
        )
        .unwrap();
        assert_eq!(request.buffer_distance_m, 100.0);
        assert!(!request.exclude_nature);
        assert_eq!(request.min_area_ha, 3.5);
        assert_eq!(request.max_grid_distance_m, 1500.0);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let request = AnalyzeRequest {
            buffer_distance_m: 5_000.0,
            exclude_nature: true,
            min_area_ha: 0.0,
            max_grid_distance_m: 50.0,
        };
        let config = request.to_config().unwrap();
        assert_eq!(config.buffer_distance_m(), 2000.0);
        assert_eq!(config.min_area_ha(), 0.1);
        assert_eq!(config.max_grid_distance_m(), 100.0);
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        assert!(serde_json::from_str::<AnalyzeRequest>(r#"{"exclude_nature": "yes"}"#).is_err());
        assert!(serde_json::from_str::<AnalyzeRequest>(r#"{"min_area_ha": "big"}"#).is_err());
    }
}
