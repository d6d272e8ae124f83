use crate::error::{Result, SolarscoutError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// ETRS89 / UTM zone 32N: meters on both axes, true areas for the deployment region
pub const DEFAULT_CANONICAL_SRID: u32 = 25832;

/// WGS 84, assumed for raw features that declare no CRS
pub const DEFAULT_SOURCE_SRID: u32 = 4326;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for SolarScout
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub canonical_srid: ConfigValue<u32>,
    pub default_source_srid: ConfigValue<u32>,
    pub output_srid: ConfigValue<u32>,
    /// Per-analysis budget; 0 means unbounded
    pub analysis_timeout_ms: ConfigValue<u64>,
    pub area_weight: ConfigValue<f64>,
    pub distance_weight: ConfigValue<f64>,
    pub area_reference_ha: ConfigValue<f64>,
    pub distance_reference_m: ConfigValue<f64>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            canonical_srid: ConfigValue::new(DEFAULT_CANONICAL_SRID, ConfigSource::Default),
            default_source_srid: ConfigValue::new(DEFAULT_SOURCE_SRID, ConfigSource::Default),
            output_srid: ConfigValue::new(4326, ConfigSource::Default),
            analysis_timeout_ms: ConfigValue::new(30_000, ConfigSource::Default),
            area_weight: ConfigValue::new(0.6, ConfigSource::Default),
            distance_weight: ConfigValue::new(0.4, ConfigSource::Default),
            area_reference_ha: ConfigValue::new(10.0, ConfigSource::Default),
            distance_reference_m: ConfigValue::new(1000.0, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| SolarscoutError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| SolarscoutError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(srid) = file_config.canonical_srid {
            self.canonical_srid.update(srid, ConfigSource::File);
        }
        if let Some(srid) = file_config.default_source_srid {
            self.default_source_srid.update(srid, ConfigSource::File);
        }
        if let Some(srid) = file_config.output_srid {
            self.output_srid.update(srid, ConfigSource::File);
        }
        if let Some(timeout) = file_config.analysis_timeout_ms {
            self.analysis_timeout_ms.update(timeout, ConfigSource::File);
        }

        if let Some(scoring) = file_config.scoring {
            if let Some(weight) = scoring.area_weight {
                self.area_weight.update(weight, ConfigSource::File);
            }
            if let Some(weight) = scoring.distance_weight {
                self.distance_weight.update(weight, ConfigSource::File);
            }
            if let Some(reference) = scoring.area_reference_ha {
                self.area_reference_ha.update(reference, ConfigSource::File);
            }
            if let Some(reference) = scoring.distance_reference_m {
                self.distance_reference_m.update(reference, ConfigSource::File);
            }
        }

        Ok(self)
    }

    /// Load configuration from `SOLARSCOUT_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        env_override("SOLARSCOUT_CANONICAL_SRID", &mut self.canonical_srid);
        env_override("SOLARSCOUT_DEFAULT_SOURCE_SRID", &mut self.default_source_srid);
        env_override("SOLARSCOUT_OUTPUT_SRID", &mut self.output_srid);
        env_override("SOLARSCOUT_ANALYSIS_TIMEOUT_MS", &mut self.analysis_timeout_ms);
        env_override("SOLARSCOUT_AREA_WEIGHT", &mut self.area_weight);
        env_override("SOLARSCOUT_DISTANCE_WEIGHT", &mut self.distance_weight);
        env_override("SOLARSCOUT_AREA_REFERENCE_HA", &mut self.area_reference_ha);
        env_override("SOLARSCOUT_DISTANCE_REFERENCE_M", &mut self.distance_reference_m);
        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(srid) = overrides.canonical_srid {
            self.canonical_srid.update(srid, ConfigSource::Cli);
        }
        if let Some(srid) = overrides.default_source_srid {
            self.default_source_srid.update(srid, ConfigSource::Cli);
        }
        if let Some(srid) = overrides.output_srid {
            self.output_srid.update(srid, ConfigSource::Cli);
        }
        if let Some(timeout) = overrides.analysis_timeout_ms {
            self.analysis_timeout_ms.update(timeout, ConfigSource::Cli);
        }
    }

    /// Check cross-field constraints after all layers are applied
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("area_weight", self.area_weight.value),
            ("distance_weight", self.distance_weight.value),
        ];
        for (key, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SolarscoutError::ConfigInvalid {
                    key: key.to_string(),
                    reason: format!("weight must be a non-negative number, got {}", weight),
                });
            }
        }
        if self.area_weight.value + self.distance_weight.value <= 0.0 {
            return Err(SolarscoutError::ConfigInvalid {
                key: "scoring".to_string(),
                reason: "at least one scoring weight must be positive".to_string(),
            });
        }

        let references = [
            ("area_reference_ha", self.area_reference_ha.value),
            ("distance_reference_m", self.distance_reference_m.value),
        ];
        for (key, reference) in references {
            if !reference.is_finite() || reference <= 0.0 {
                return Err(SolarscoutError::ConfigInvalid {
                    key: key.to_string(),
                    reason: format!("reference must be a positive number, got {}", reference),
                });
            }
        }

        Ok(())
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "canonical_srid".to_string(),
            (format!("EPSG:{}", self.canonical_srid.value), self.canonical_srid.source),
        );
        map.insert(
            "default_source_srid".to_string(),
            (format!("EPSG:{}", self.default_source_srid.value), self.default_source_srid.source),
        );
        map.insert(
            "output_srid".to_string(),
            (format!("EPSG:{}", self.output_srid.value), self.output_srid.source),
        );
        map.insert(
            "analysis_timeout_ms".to_string(),
            (self.analysis_timeout_ms.value.to_string(), self.analysis_timeout_ms.source),
        );
        map.insert(
            "area_weight".to_string(),
            (self.area_weight.value.to_string(), self.area_weight.source),
        );
        map.insert(
            "distance_weight".to_string(),
            (self.distance_weight.value.to_string(), self.distance_weight.source),
        );
        map.insert(
            "area_reference_ha".to_string(),
            (self.area_reference_ha.value.to_string(), self.area_reference_ha.source),
        );
        map.insert(
            "distance_reference_m".to_string(),
            (self.distance_reference_m.value.to_string(), self.distance_reference_m.source),
        );

        map
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn env_override<T>(name: &str, target: &mut ConfigValue<T>)
where
    T: FromStr,
    T::Err: Display,
{
    if let Ok(raw) = env::var(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => target.update(value, ConfigSource::Environment),
            Err(e) => tracing::warn!("Invalid {} value '{}': {}", name, raw, e),
        }
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    canonical_srid: Option<u32>,
    default_source_srid: Option<u32>,
    output_srid: Option<u32>,
    analysis_timeout_ms: Option<u64>,
    scoring: Option<ScoringSection>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ScoringSection {
    area_weight: Option<f64>,
    distance_weight: Option<f64>,
    area_reference_ha: Option<f64>,
    distance_reference_m: Option<f64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub canonical_srid: Option<u32>,
    pub default_source_srid: Option<u32>,
    pub output_srid: Option<u32>,
    pub analysis_timeout_ms: Option<u64>,
}
