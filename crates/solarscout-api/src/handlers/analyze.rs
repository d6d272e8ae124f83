use std::sync::Arc;

use axum::{extract::State, Json};
use geojson::FeatureCollection;

use crate::dto::AnalyzeRequest;
use crate::error::ApiError;
use crate::services::AnalysisService;
use crate::state::AppState;

pub async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<FeatureCollection>, ApiError> {
    tracing::info!(
        buffer_distance_m = request.buffer_distance_m,
        exclude_nature = request.exclude_nature,
        min_area_ha = request.min_area_ha,
        max_grid_distance_m = request.max_grid_distance_m,
        "Processing analyze request"
    );

    let result = AnalysisService::execute(&state, &request).await?;

    Ok(Json(result))
}
