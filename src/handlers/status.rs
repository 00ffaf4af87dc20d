//! Engine status handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::logic::model::EngineStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub engine: EngineStatus,
    pub reference_rows: usize,
    pub explain_permutations: usize,
    pub explain_seed: u64,
    pub environment: String,
}

pub async fn get(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        engine: state.pipeline.service().status(),
        reference_rows: state.pipeline.reference().len(),
        explain_permutations: state.pipeline.explain_config().permutations,
        explain_seed: state.pipeline.explain_config().seed,
        environment: state.config.environment.clone(),
    })
}
