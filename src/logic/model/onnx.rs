//! ONNX Runtime model
//!
//! Regressors exported to ONNX take one float tensor `[batch, FEATURE_COUNT]`
//! in layout order and return one price per row on their first output.
//! ONNX graphs carry no column names, so the layout names are assumed and the
//! probe prediction in `PredictionService::new` catches shape disagreements.

use ndarray::{Array1, Array2, ArrayView2};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use parking_lot::Mutex;

use super::inference::{InferenceError, ModelKind, PriceModel};
use crate::logic::features::layout;

pub struct OnnxModel {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    output_name: String,
    feature_names: Vec<String>,
}

impl OnnxModel {
    /// Load ONNX model from bytes (already checksummed by the loader)
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, InferenceError> {
        tracing::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| InferenceError(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| InferenceError(format!("Load from memory error: {}", e)))?;

        if session.inputs.len() != 1 {
            return Err(InferenceError(format!(
                "expected a single input tensor, model has {}",
                session.inputs.len()
            )));
        }

        let output_name = session.outputs.first()
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError("No output defined".to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            feature_names: layout::feature_names().map(String::from).collect(),
        })
    }
}

impl PriceModel for OnnxModel {
    fn name(&self) -> &str {
        "onnx-regressor"
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Onnx
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_batch(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, InferenceError> {
        let batch = rows.nrows();
        let input_array: Array2<f32> = rows.mapv(|v| v as f32);

        let input_tensor = Tensor::from_array(input_array)
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        let output = outputs.get(&self.output_name)
            .ok_or_else(|| InferenceError("No output".to_string()))?;

        let output_tensor = output.try_extract_tensor::<f32>()
            .map_err(|e| InferenceError(format!("Extract error: {}", e)))?;

        // [batch] or [batch, 1]
        let data = output_tensor.1;
        if data.len() != batch {
            return Err(InferenceError(format!(
                "expected {} outputs, got {}",
                batch,
                data.len()
            )));
        }

        Ok(data.iter().map(|&p| p as f64).collect())
    }
}
