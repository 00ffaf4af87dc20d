//! Marseille Rent server
//!
//! Refuses to start when the model artifact or the reference data cannot be
//! loaded.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marseille_rent::{config::Config, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marseille_rent=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Marseille Rent starting ({})...", config.environment);
    tracing::info!("Model: {}", config.model_path.display());
    tracing::info!("Reference data: {}", config.reference_path.display());

    if config.is_production() && config.model_sha256.is_none() {
        tracing::warn!("Running in production without MODEL_SHA256");
    }

    let state = AppState::load(config.clone())
        .context("failed to load model or reference data")?;
    tracing::info!(
        reference_rows = state.pipeline.reference().len(),
        "Pipeline ready"
    );

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
