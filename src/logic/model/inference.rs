//! Inference Engine - Prediction Service
//!
//! Wraps a loaded `PriceModel` behind schema checks so a record that does not
//! match the layout never reaches the model.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::logic::features::{layout, FeatureRecord, RecordShapeError, FEATURE_COUNT};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("InferenceError: {0}")]
pub struct InferenceError(pub String);

// ============================================================================
// MODEL TRAIT
// ============================================================================

/// Backend that produced the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    Onnx,
    Custom,
}

/// Capability contract for any regression model serving prices
///
/// Rows are records in layout order; the output holds one price per row.
pub trait PriceModel: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ModelKind;

    /// Column names the model was fitted on, in order
    fn feature_names(&self) -> &[String];

    fn predict_batch(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, InferenceError>;
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_name: String,
    pub model_kind: ModelKind,
    pub source: String,
    pub features: usize,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Engine status for the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub model: ModelMetadata,
    pub avg_latency_ms: f64,
    pub inference_count: u64,
}

// ============================================================================
// PREDICTION SERVICE
// ============================================================================

/// Read-only prediction service shared by all requests
pub struct PredictionService {
    model: Arc<dyn PriceModel>,
    metadata: ModelMetadata,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl PredictionService {
    /// Wrap a model, checking it against the layout
    ///
    /// The model's feature names must equal the layout and a probe record
    /// must produce a finite price, otherwise `ModelLoad`.
    pub fn new(model: Arc<dyn PriceModel>, source: impl Into<String>) -> PipelineResult<Self> {
        if !layout::matches_layout(model.feature_names()) {
            return Err(PipelineError::ModelLoad(format!(
                "model '{}' expects features {:?}, layout is {:?}",
                model.name(),
                model.feature_names(),
                layout::feature_names().collect::<Vec<_>>(),
            )));
        }

        let metadata = ModelMetadata {
            model_name: model.name().to_string(),
            model_kind: model.kind(),
            source: source.into(),
            features: FEATURE_COUNT,
            loaded_at: chrono::Utc::now(),
        };

        let service = Self {
            model,
            metadata,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        };

        let probe = service
            .predict(&FeatureRecord::probe())
            .map_err(|e| PipelineError::ModelLoad(format!("probe prediction failed: {}", e)))?;
        tracing::debug!(model = %service.metadata.model_name, probe, "Model probe succeeded");

        Ok(service)
    }

    /// Predict the nightly price of one record
    pub fn predict(&self, record: &FeatureRecord) -> PipelineResult<f64> {
        record.validate().map_err(|e| match e {
            RecordShapeError::Value { .. } => PipelineError::InvalidInput(e.to_string()),
            _ => PipelineError::SchemaMismatch(e.to_string()),
        })?;

        let row = ArrayView2::from_shape((1, record.len()), record.as_slice())
            .map_err(|e| PipelineError::SchemaMismatch(e.to_string()))?;

        let prices = self.predict_rows(row)?;
        prices
            .first()
            .copied()
            .ok_or_else(|| PipelineError::Prediction("model returned no output".to_string()))
    }

    /// Predict a batch of layout-ordered rows
    pub fn predict_rows(&self, rows: ArrayView2<'_, f64>) -> PipelineResult<Array1<f64>> {
        if rows.ncols() != self.metadata.features {
            return Err(PipelineError::SchemaMismatch(format!(
                "rows have {} columns, model expects {}",
                rows.ncols(),
                self.metadata.features
            )));
        }

        let start_time = std::time::Instant::now();
        let prices = self
            .model
            .predict_batch(rows)
            .map_err(|e| PipelineError::Prediction(e.to_string()))?;

        // Track metrics
        let elapsed = start_time.elapsed().as_micros() as u64;
        self.latency_sum_us.fetch_add(elapsed, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        if prices.len() != rows.nrows() {
            return Err(PipelineError::Prediction(format!(
                "model returned {} outputs for {} rows",
                prices.len(),
                rows.nrows()
            )));
        }
        if let Some(bad) = prices.iter().find(|p| !p.is_finite()) {
            return Err(PipelineError::Prediction(format!("model returned non-finite price {}", bad)));
        }

        Ok(prices)
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 };

        EngineStatus {
            model_loaded: true,
            model: self.metadata.clone(),
            avg_latency_ms: avg,
            inference_count: count,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
