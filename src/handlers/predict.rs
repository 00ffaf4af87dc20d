//! Prediction API handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::blocking;
use crate::logic::features::{FeatureRecord, RawFeatureInput};
use crate::logic::present::{MAX_TOP_N, MIN_TOP_N};
use crate::logic::{PipelineOutput, RunOptions};
use crate::{AppResult, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct PredictRequest {
    /// Raw field values keyed by schema name
    pub fields: RawFeatureInput,
    #[serde(default)]
    pub explain: bool,
    #[validate(range(min = MIN_TOP_N, max = MAX_TOP_N))]
    pub top_n: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordQuery {
    #[serde(default)]
    pub explain: bool,
    #[validate(range(min = MIN_TOP_N, max = MAX_TOP_N))]
    pub top_n: Option<usize>,
}

fn run_options(state: &AppState, explain: bool, top_n: Option<usize>) -> RunOptions {
    let defaults = state.pipeline.default_options();
    RunOptions {
        explain,
        top_n: top_n.unwrap_or(defaults.top_n),
    }
}

/// Price raw field values
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> AppResult<Json<PipelineOutput>> {
    req.validate()?;

    let options = run_options(&state, req.explain, req.top_n);
    let pipeline = state.pipeline.clone();
    let fields = req.fields;
    let output = blocking(move || pipeline.run(&fields, options)).await??;

    Ok(Json(output))
}

/// Price an already built record (layout-stamped vector)
pub async fn predict_record(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
    Json(record): Json<FeatureRecord>,
) -> AppResult<Json<PipelineOutput>> {
    query.validate()?;

    let options = run_options(&state, query.explain, query.top_n);
    let pipeline = state.pipeline.clone();
    let output = blocking(move || pipeline.run_record(record, options)).await??;

    Ok(Json(output))
}
