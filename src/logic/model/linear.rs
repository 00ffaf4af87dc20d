//! Linear regression artifact
//!
//! Coefficients exported from the fitted regression as JSON:
//!
//! ```json
//! {"format": "linear", "version": 1, "feature_names": [...],
//!  "coefficients": [...], "intercept": 42.0}
//! ```

use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::inference::{InferenceError, ModelKind, PriceModel};

/// Supported artifact versions
pub const LINEAR_ARTIFACT_VERSION: u32 = 1;

fn default_version() -> u32 {
    LINEAR_ARTIFACT_VERSION
}

/// Ordinary linear regression: price = intercept + coefficients · x
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default = "default_version")]
    pub version: u32,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn new(
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, InferenceError> {
        let model = Self {
            version: LINEAR_ARTIFACT_VERSION,
            feature_names,
            coefficients,
            intercept,
        };
        model.check()?;
        Ok(model)
    }

    /// Internal consistency of a parsed artifact
    pub fn check(&self) -> Result<(), InferenceError> {
        if self.version != LINEAR_ARTIFACT_VERSION {
            return Err(InferenceError(format!(
                "unsupported linear artifact version {}",
                self.version
            )));
        }
        if self.feature_names.len() != self.coefficients.len() {
            return Err(InferenceError(format!(
                "{} feature names but {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(InferenceError("non-finite coefficient".to_string()));
        }
        Ok(())
    }
}

impl PriceModel for LinearModel {
    fn name(&self) -> &str {
        "linear-regression"
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Linear
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_batch(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, InferenceError> {
        if rows.ncols() != self.coefficients.len() {
            return Err(InferenceError(format!(
                "expected {} columns, got {}",
                self.coefficients.len(),
                rows.ncols()
            )));
        }
        let coefficients = Array1::from(self.coefficients.clone());
        Ok(rows.dot(&coefficients) + self.intercept)
    }
}

/// JSON model artifacts, tagged by `format`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum JsonArtifact {
    Linear(LinearModel),
}

impl JsonArtifact {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InferenceError> {
        let artifact: JsonArtifact = serde_json::from_slice(bytes)
            .map_err(|e| InferenceError(format!("corrupt model artifact: {}", e)))?;
        match &artifact {
            JsonArtifact::Linear(model) => model.check()?,
        }
        Ok(artifact)
    }

    pub fn into_model(self) -> LinearModel {
        match self {
            JsonArtifact::Linear(model) => model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn test_predict_batch() {
        let model = LinearModel::new(names(2), vec![2.0, -1.0], 10.0).unwrap();
        let rows = array![[1.0, 1.0], [3.0, 0.0]];
        let out = model.predict_batch(rows.view()).unwrap();
        assert_eq!(out, array![11.0, 16.0]);
    }

    #[test]
    fn test_width_mismatch() {
        let model = LinearModel::new(names(2), vec![2.0, -1.0], 0.0).unwrap();
        let rows = array![[1.0, 1.0, 1.0]];
        assert!(model.predict_batch(rows.view()).is_err());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        assert!(LinearModel::new(names(3), vec![1.0], 0.0).is_err());
    }

    #[test]
    fn test_parse_artifact() {
        let json = br#"{"format":"linear","feature_names":["a","b"],"coefficients":[1.5,2.0],"intercept":3.0}"#;
        let model = JsonArtifact::from_slice(json).unwrap().into_model();
        assert_eq!(model.version, LINEAR_ARTIFACT_VERSION);
        assert_eq!(model.coefficients, vec![1.5, 2.0]);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let json = br#"{"format":"random_forest","trees":[]}"#;
        assert!(JsonArtifact::from_slice(json).is_err());
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let json = br#"{"format":"linear","version":7,"feature_names":["a"],"coefficients":[1.0],"intercept":0.0}"#;
        assert!(JsonArtifact::from_slice(json).is_err());
    }

    #[test]
    fn test_serialize_round_trip_keeps_tag() {
        let artifact = JsonArtifact::Linear(LinearModel::new(names(1), vec![1.0], 0.0).unwrap());
        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["format"], "linear");
    }
}
