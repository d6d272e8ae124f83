use std::time::Duration;

use geojson::FeatureCollection;
use solarscout_analysis::{analyze_with, ResultEncoder};
use solarscout_core::error::SolarscoutError;

use crate::dto::AnalyzeRequest;
use crate::error::ApiError;
use crate::state::AppState;

/// Slack on top of the cooperative budget before the hard bound fires
const HARD_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Service for running analyses against the current snapshot
pub struct AnalysisService;

impl AnalysisService {
    /// Analyze and encode as a GeoJSON FeatureCollection
    pub async fn execute(
        state: &AppState,
        request: &AnalyzeRequest,
    ) -> Result<FeatureCollection, ApiError> {
        let config = request.to_config()?;
        let snapshot = state.store.current()?;
        let options = state.options;
        let (canonical_srid, output_srid) = (state.canonical_srid, state.output_srid);

        let task = tokio::task::spawn_blocking(move || {
            let sites = analyze_with(&snapshot, &config, &options)?;
            ResultEncoder::new(canonical_srid, output_srid)?.encode(&sites)
        });

        let joined = match options.timeout {
            Some(budget) => tokio::time::timeout(budget + HARD_TIMEOUT_SLACK, task)
                .await
                .map_err(|_| {
                    tracing::warn!(budget_ms = budget.as_millis() as u64, "Analysis exceeded hard time bound");
                    ApiError::from(SolarscoutError::AnalysisTimeout {
                        stage: "request".to_string(),
                        budget_ms: budget.as_millis() as u64,
                    })
                })?,
            None => task.await,
        };

        let collection = joined.map_err(|e| {
            tracing::error!(error = %e, "Analysis task failed");
            ApiError::internal("Analysis task failed").with_details(e.to_string())
        })??;

        Ok(collection)
    }
}
