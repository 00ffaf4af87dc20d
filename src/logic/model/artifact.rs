//! Model artifact loading
//!
//! Reads the artifact once at start-up, verifies its SHA-256 when a checksum
//! is configured and picks the backend from the file extension.

use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::inference::{PredictionService, PriceModel};
use super::linear::JsonArtifact;
use super::onnx::OnnxModel;
use crate::error::{PipelineError, PipelineResult};

/// Hex SHA-256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compare against an expected checksum (case-insensitive hex)
pub fn verify_checksum(bytes: &[u8], expected: &str) -> PipelineResult<()> {
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(PipelineError::ModelLoad(format!(
            "checksum mismatch: expected {}, got {}",
            expected.trim(),
            actual
        )));
    }
    Ok(())
}

/// Load the model artifact and wrap it in a PredictionService
pub fn load_model(path: &Path, expected_sha256: Option<&str>) -> PipelineResult<PredictionService> {
    tracing::info!("Loading model artifact from: {}", path.display());

    if !path.exists() {
        return Err(PipelineError::ModelLoad(format!("model not found: {}", path.display())));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| PipelineError::ModelLoad(format!("cannot read {}: {}", path.display(), e)))?;

    match expected_sha256 {
        Some(expected) => verify_checksum(&bytes, expected)?,
        None => tracing::warn!("MODEL_SHA256 not set, skipping checksum verification"),
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let model: Arc<dyn PriceModel> = match extension.as_str() {
        "json" => Arc::new(
            JsonArtifact::from_slice(&bytes)
                .map_err(|e| PipelineError::ModelLoad(e.to_string()))?
                .into_model(),
        ),
        "onnx" => Arc::new(
            OnnxModel::from_bytes(&bytes).map_err(|e| PipelineError::ModelLoad(e.to_string()))?,
        ),
        other => {
            return Err(PipelineError::ModelLoad(format!(
                "unsupported model format '{}' (expected .json or .onnx)",
                other
            )));
        }
    };

    let service = PredictionService::new(model, path.display().to_string())?;
    tracing::info!(
        model = %service.metadata().model_name,
        kind = ?service.metadata().model_kind,
        "Model loaded successfully"
    );
    Ok(service)
}
