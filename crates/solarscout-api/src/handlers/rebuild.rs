use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::RebuildResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Rebuild the snapshot from the configured source and swap it in
pub async fn handle_rebuild(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RebuildResponse>, ApiError> {
    let source = state.source.as_ref().ok_or_else(|| {
        ApiError::bad_request("No raw-feature source configured")
            .with_details("Set SOLARSCOUT_SOURCE to a GeoJSON file")
    })?;

    tracing::info!(source = %source.describe(), "Triggering snapshot rebuild");

    let snapshot = state.store.rebuild(source.as_ref()).await?;

    Ok(Json(RebuildResponse::from_snapshot(&snapshot)))
}
