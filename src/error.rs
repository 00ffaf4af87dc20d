//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the prediction pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Bad or out-of-range user input; the user can fix it and resubmit
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Record and model disagree on the feature layout
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Model artifact missing, corrupt or incompatible (start-up only)
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// Reference data missing or malformed (start-up only)
    #[error("reference data error: {0}")]
    ReferenceData(String),

    /// Explanation could not be computed; the prediction is still valid
    #[error("attribution unavailable: {0}")]
    AttributionUnavailable(String),

    /// Model failed at run time on a well-formed record
    #[error("prediction failed: {0}")]
    Prediction(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

pub type AppResult<T> = Result<T, AppError>;

/// Errors returned by HTTP handlers
#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),

    // Validation errors
    ValidationError(String),

    // Configuration bugs surfaced per request
    SchemaMismatch(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::SchemaMismatch(msg) => {
                tracing::error!("Schema mismatch: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, "Prediction failed: model input schema mismatch")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(msg) => AppError::ValidationError(msg),
            PipelineError::SchemaMismatch(msg) => AppError::SchemaMismatch(msg),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
