use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/analyze", post(handlers::handle_analyze))
        .route("/api/rebuild", post(handlers::handle_rebuild))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
