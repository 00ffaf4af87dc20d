//! Explain Module - Per-feature attribution of a single prediction

pub mod engine;
pub mod types;

pub use engine::{explain, explain_with, ExplainConfig, Explainer};
pub use types::{AttributionResult, FeatureContribution};
