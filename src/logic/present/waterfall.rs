//! Waterfall ordering of an attribution
//!
//! Baseline first, then one step per field by descending magnitude; fields
//! beyond the top N are folded into a single step so the last step still
//! ends on the prediction.

use serde::{Deserialize, Serialize};

use crate::logic::explain::AttributionResult;

/// Default number of fields shown before folding
pub const DEFAULT_TOP_N: usize = 20;

/// Accepted range for `top_n` (config and API)
pub const MIN_TOP_N: usize = 1;
pub const MAX_TOP_N: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub label: String,
    /// Field value in the record; `None` for the folded step
    pub value: Option<f64>,
    pub contribution: f64,
    /// Cumulative value before this step
    pub start: f64,
    /// Cumulative value after this step
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waterfall {
    pub baseline: f64,
    pub prediction: f64,
    pub steps: Vec<WaterfallStep>,
    /// Number of fields folded into the last step
    pub folded: usize,
}

impl Waterfall {
    pub fn build(result: &AttributionResult, top_n: usize) -> Self {
        let ranked = result.ranked();
        let shown = top_n.min(ranked.len());

        let mut steps = Vec::with_capacity(shown + 1);
        let mut cumulative = result.baseline;

        for c in &ranked[..shown] {
            let start = cumulative;
            cumulative += c.contribution;
            steps.push(WaterfallStep {
                label: c.name.clone(),
                value: Some(c.value),
                contribution: c.contribution,
                start,
                end: cumulative,
            });
        }

        let rest = &ranked[shown..];
        if !rest.is_empty() {
            let contribution: f64 = rest.iter().map(|c| c.contribution).sum();
            let start = cumulative;
            cumulative += contribution;
            steps.push(WaterfallStep {
                label: format!("{} other features", rest.len()),
                value: None,
                contribution,
                start,
                end: cumulative,
            });
        }

        Self {
            baseline: result.baseline,
            prediction: result.prediction,
            steps,
            folded: rest.len(),
        }
    }

    /// Cumulative value after the last step
    pub fn final_value(&self) -> f64 {
        self.steps.last().map(|s| s.end).unwrap_or(self.baseline)
    }

    /// Largest absolute contribution (for bar scaling)
    pub fn max_magnitude(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| s.contribution.abs())
            .fold(0.0, f64::max)
    }
}
