//! Prediction pipeline
//!
//! One synchronous pass per submission:
//! raw input → record → prediction → optional attribution → presentation.
//! Attribution failures are logged and only remove the waterfall.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{PipelineError, PipelineResult};
use crate::logic::explain::{AttributionResult, ExplainConfig, Explainer};
use crate::logic::features::{build_record, FeatureRecord, RawFeatureInput};
use crate::logic::model::PredictionService;
use crate::logic::present::{Presentation, DEFAULT_TOP_N};
use crate::logic::reference::ReferenceSet;

/// Per-request options
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub explain: bool,
    pub top_n: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { explain: false, top_n: DEFAULT_TOP_N }
    }
}

/// Everything produced for one submission
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub request_id: Uuid,
    pub record: FeatureRecord,
    pub prediction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<AttributionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution_error: Option<String>,
    pub presentation: Presentation,
}

/// Shared, read-only pipeline (model + reference set)
#[derive(Debug)]
pub struct Pipeline {
    service: Arc<PredictionService>,
    explainer: Explainer,
    default_top_n: usize,
}

impl Pipeline {
    pub fn new(service: Arc<PredictionService>, reference: Arc<ReferenceSet>) -> Self {
        Self {
            service,
            explainer: Explainer::new(reference),
            default_top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_explain_config(mut self, config: ExplainConfig) -> Self {
        self.explainer = self.explainer.with_config(config);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.default_top_n = top_n;
        self
    }

    pub fn service(&self) -> &PredictionService {
        &self.service
    }

    pub fn reference(&self) -> &ReferenceSet {
        self.explainer.background()
    }

    pub fn explain_config(&self) -> &ExplainConfig {
        self.explainer.config()
    }

    pub fn default_options(&self) -> RunOptions {
        RunOptions { explain: false, top_n: self.default_top_n }
    }

    /// Build the record from raw input, then predict (and explain)
    pub fn run(&self, input: &RawFeatureInput, options: RunOptions) -> PipelineResult<PipelineOutput> {
        let record = build_record(input)?;
        self.run_record(record, options)
    }

    /// Predict (and explain) an already built record
    pub fn run_record(&self, record: FeatureRecord, options: RunOptions) -> PipelineResult<PipelineOutput> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", %request_id);
        let _guard = span.enter();

        tracing::debug!(record = %record.to_log_entry(), "Record built");
        let prediction = self.service.predict(&record)?;
        tracing::info!(prediction, explain = options.explain, "Prediction computed");

        let mut presentation = Presentation::new(prediction);
        let mut attribution = None;
        let mut attribution_error = None;

        if options.explain {
            match self.explain(&record) {
                Ok(result) => {
                    presentation = presentation.with_attribution(&result, options.top_n);
                    attribution = Some(result);
                }
                Err(e) => {
                    tracing::warn!("Attribution skipped: {}", e);
                    let reason = match e {
                        PipelineError::AttributionUnavailable(reason) => reason,
                        other => other.to_string(),
                    };
                    presentation = presentation.with_notice(reason.clone());
                    attribution_error = Some(reason);
                }
            }
        }

        Ok(PipelineOutput {
            request_id,
            record,
            prediction,
            attribution,
            attribution_error,
            presentation,
        })
    }

    /// Attribution for one record against the shared reference set
    pub fn explain(&self, record: &FeatureRecord) -> PipelineResult<AttributionResult> {
        self.explainer
            .explain(record, |rows| self.service.predict_rows(rows))
    }
}

// ============================================================================
// TESTS
// ============================================================================
