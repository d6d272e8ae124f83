use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use solarscout_core::error::SolarscoutError;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SolarscoutError> for ApiError {
    fn from(err: SolarscoutError) -> Self {
        let details = err.to_string();
        match err {
            SolarscoutError::SnapshotUnavailable => Self::service_unavailable("No dataset snapshot loaded"),
            SolarscoutError::RebuildInProgress => {
                Self::conflict("Rebuild already in progress").with_details(details)
            }
            SolarscoutError::ConfigInvalid { .. } => {
                Self::bad_request("Invalid analysis parameters").with_details(details)
            }
            SolarscoutError::AnalysisTimeout { .. } => {
                Self::gateway_timeout("Analysis timed out").with_details(details)
            }
            SolarscoutError::RebuildFailed { .. } => {
                tracing::error!(error = %details, "Rebuild failed");
                Self::internal("Rebuild failed").with_details(details)
            }
            _ => {
                tracing::error!(error = %details, "Request failed");
                Self::internal("Internal error").with_details(details)
            }
        }
    }
}
