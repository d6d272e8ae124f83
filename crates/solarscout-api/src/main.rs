use std::sync::Arc;

use anyhow::Context;
use solarscout_core::config::LayeredConfig;
use solarscout_core::formats::GeoJsonFeatureSource;
use solarscout_core::ports::RawFeatureSource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solarscout_api::{create_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solarscout_api=info,solarscout_analysis=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_config = ApiConfig::from_env();

    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = &api_config.config_path {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
    }
    let config = config.load_from_env();

    let source: Option<Arc<dyn RawFeatureSource>> = api_config
        .source_path
        .as_ref()
        .map(|path| Arc::new(GeoJsonFeatureSource::new(path)) as Arc<dyn RawFeatureSource>);

    let state = Arc::new(AppState::new(&config, source).context("Invalid configuration")?);

    tracing::info!(
        port = api_config.port,
        canonical_srid = state.canonical_srid,
        output_srid = state.output_srid,
        "Starting SolarScout API server"
    );

    match &state.source {
        Some(source) => match state.store.rebuild(source.as_ref()).await {
            Ok(snapshot) => tracing::info!(
                version = snapshot.version,
                parcels = snapshot.parcels.len(),
                "Initial snapshot ready"
            ),
            Err(e) => tracing::error!(error = %e, "Initial rebuild failed; serving without a snapshot"),
        },
        None => tracing::warn!("SOLARSCOUT_SOURCE not set; analysis is unavailable until a snapshot is built"),
    }

    let app = create_router(state).layer(api_config.cors_layer());

    let addr = api_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(origins = ?api_config.cors_origins, "Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
