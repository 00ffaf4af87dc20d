//! Marseille Rent - nightly rental price estimator
//!
//! Collects property attributes through a single-page form, prices them with
//! a pre-trained regression model and optionally explains the price with
//! per-feature contributions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       MARSEILLE RENT                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  form / JSON ──► Feature Builder ──► FeatureRecord           │
//! │                                        │                     │
//! │                     ┌──────────────────┴─────────────┐       │
//! │                     ▼                                ▼       │
//! │            Prediction Service              Attribution Engine │
//! │            (linear / ONNX)                 (reference set)   │
//! │                     └──────────────┬─────────────────┘       │
//! │                                    ▼                         │
//! │                          Presentation (waterfall)            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logic;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult, PipelineError, PipelineResult};

use logic::model::load_model;
use logic::reference::load_reference;
use logic::Pipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub config: config::Config,
}

impl AppState {
    /// Load model and reference data; any failure must stop start-up
    pub fn load(config: config::Config) -> PipelineResult<Self> {
        let service = load_model(&config.model_path, config.model_sha256.as_deref())?;

        let reference = load_reference(&config.reference_path, config.reference_delimiter)?
            .subsample(config.reference_max_rows, config.explain_seed);

        let pipeline = Pipeline::new(Arc::new(service), Arc::new(reference))
            .with_explain_config(config.explain_config())
            .with_top_n(config.top_n);

        Ok(Self::new(pipeline, config))
    }

    pub fn new(pipeline: Pipeline, config: config::Config) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Form page (HTML)
    let page_routes = Router::new()
        .route("/", get(handlers::form::index))
        .route("/predict", post(handlers::form::submit))
        .route("/assets/cover", get(handlers::assets::cover));

    // JSON API
    let api_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/schema", get(handlers::schema::get))
        .route("/api/v1/status", get(handlers::status::get))
        .route("/api/v1/predict", post(handlers::predict::predict))
        .route("/api/v1/predict/record", post(handlers::predict::predict_record));

    Router::new()
        .merge(page_routes)
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
