use std::env;
use std::path::PathBuf;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// API server configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub port: u16,
    /// Allowed browser origins; `*` allows any
    pub cors_origins: Vec<String>,
    /// Raw-feature GeoJSON the snapshot is built from
    pub source_path: Option<PathBuf>,
    /// Optional TOML file for the analysis settings
    pub config_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            source_path: None,
            config_path: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = match env::var("SOLARSCOUT_PORT") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %value, "Ignoring invalid SOLARSCOUT_PORT");
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        let cors_origins = env::var("SOLARSCOUT_CORS_ORIGINS")
            .map(|value| parse_origins(&value))
            .ok()
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()]);

        Self {
            port,
            cors_origins,
            source_path: non_empty_var("SOLARSCOUT_SOURCE").map(PathBuf::from),
            config_path: non_empty_var("SOLARSCOUT_CONFIG").map(PathBuf::from),
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }

    /// CORS layer for the configured origins; unparsable origins are skipped
    pub fn cors_layer(&self) -> CorsLayer {
        let origin = if self.allows_any_origin() {
            AllowOrigin::from(Any)
        } else {
            let origins: Vec<HeaderValue> = self
                .cors_origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
