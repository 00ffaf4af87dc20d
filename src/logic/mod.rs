//! Core prediction logic
//!
//! Leaf-first: features → model → reference → explain → present → pipeline.

pub mod features;
pub mod model;
pub mod reference;
pub mod explain;
pub mod present;
pub mod pipeline;

pub use pipeline::{Pipeline, PipelineOutput, RunOptions};
