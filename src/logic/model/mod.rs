//! Model Module - Price Inference
//!
//! Artifact loading is separate from inference so the model backend can be
//! swapped (JSON linear coefficients, ONNX graph, or a test double).

pub mod inference;
pub mod linear;
pub mod onnx;
pub mod artifact;

// Re-export common types
pub use inference::{EngineStatus, InferenceError, ModelKind, ModelMetadata, PredictionService, PriceModel};
pub use linear::{JsonArtifact, LinearModel};
pub use onnx::OnnxModel;
pub use artifact::load_model;
