//! HTTP handlers

pub mod health;
pub mod form;
pub mod predict;
pub mod schema;
pub mod status;
pub mod assets;

use crate::{AppError, AppResult, PipelineResult};

/// Run a CPU-bound pipeline call off the async workers
pub(crate) async fn blocking<T, F>(f: F) -> AppResult<PipelineResult<T>>
where
    F: FnOnce() -> PipelineResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::InternalError(format!("pipeline task failed: {}", e)))
}
