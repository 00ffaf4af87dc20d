//! Permutation-sampling Shapley attribution
//!
//! For a sampled field order π and a background row b, start from b and
//! switch fields to the record's values one at a time in π order; each field
//! is credited the change in prediction. Every chain telescopes to
//! f(x) - f(b), so the averaged contributions sum to f(x) - E[f(b)] exactly.
//! Each permutation is paired with its reverse (antithetic sampling), which
//! makes pairwise interactions split evenly even with few permutations.

use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView2};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use super::types::{AttributionResult, FeatureContribution};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::features::{layout, FeatureRecord, FEATURE_COUNT};
use crate::logic::reference::ReferenceSet;

/// Default number of sampled permutations (each also run reversed)
pub const DEFAULT_PERMUTATIONS: usize = 10;

/// Default sampling seed
pub const DEFAULT_SEED: u64 = 42;

/// Relative tolerance of baseline + Σφ against the prediction
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplainConfig {
    pub permutations: usize,
    pub seed: u64,
    pub tolerance: f64,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            permutations: DEFAULT_PERMUTATIONS,
            seed: DEFAULT_SEED,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Attribution engine bound to a shared reference set
#[derive(Debug, Clone)]
pub struct Explainer {
    background: Arc<ReferenceSet>,
    config: ExplainConfig,
}

impl Explainer {
    pub fn new(background: Arc<ReferenceSet>) -> Self {
        Self { background, config: ExplainConfig::default() }
    }

    pub fn with_config(mut self, config: ExplainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn background(&self) -> &ReferenceSet {
        &self.background
    }

    pub fn config(&self) -> &ExplainConfig {
        &self.config
    }

    /// Explain one record with the given batch prediction function
    pub fn explain<F>(&self, record: &FeatureRecord, predict_fn: F) -> PipelineResult<AttributionResult>
    where
        F: Fn(ArrayView2<'_, f64>) -> PipelineResult<Array1<f64>>,
    {
        explain_with(record, &self.background, &self.config, predict_fn)
    }
}

/// Explain one record against `background` with the default config
pub fn explain<F>(record: &FeatureRecord, background: &ReferenceSet, predict_fn: F) -> PipelineResult<AttributionResult>
where
    F: Fn(ArrayView2<'_, f64>) -> PipelineResult<Array1<f64>>,
{
    explain_with(record, background, &ExplainConfig::default(), predict_fn)
}

pub fn explain_with<F>(
    record: &FeatureRecord,
    background: &ReferenceSet,
    config: &ExplainConfig,
    predict_fn: F,
) -> PipelineResult<AttributionResult>
where
    F: Fn(ArrayView2<'_, f64>) -> PipelineResult<Array1<f64>>,
{
    if background.is_empty() {
        return Err(unavailable("reference set is empty".to_string()));
    }
    record
        .validate()
        .map_err(|e| unavailable(format!("record does not match layout: {}", e)))?;

    let m = FEATURE_COUNT;
    let x = record.as_slice();
    let bg = background.rows();
    let n = bg.nrows();

    let row = ArrayView2::from_shape((1, m), x).map_err(|e| unavailable(e.to_string()))?;
    let prediction = call(&predict_fn, row)?[0];

    let bg_preds = call(&predict_fn, bg)?;
    let baseline = bg_preds.sum() / n as f64;

    let mut phi = vec![0.0f64; m];
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..m).collect();
    let mut passes = 0usize;

    // One batch per pass: row (r * m + k) is background row r with the
    // first k + 1 fields of the order switched to the record's values
    let mut batch = Array2::<f64>::zeros((n * m, m));

    for _ in 0..config.permutations.max(1) {
        order.shuffle(&mut rng);
        let reversed: Vec<usize> = order.iter().rev().copied().collect();

        for perm in [&order, &reversed] {
            for (r, b) in bg.outer_iter().enumerate() {
                let mut current = b.to_owned();
                for (k, &j) in perm.iter().enumerate() {
                    current[j] = x[j];
                    batch.row_mut(r * m + k).assign(&current);
                }
            }

            let out = call(&predict_fn, batch.view())?;

            for r in 0..n {
                let mut prev = bg_preds[r];
                for (k, &j) in perm.iter().enumerate() {
                    let cur = out[r * m + k];
                    phi[j] += cur - prev;
                    prev = cur;
                }
            }
            passes += 1;
        }
    }

    let scale = (passes * n) as f64;
    let contributions: Vec<FeatureContribution> = phi
        .iter()
        .enumerate()
        .map(|(j, total)| FeatureContribution {
            name: layout::feature_name(j).unwrap_or("unknown").to_string(),
            value: x[j],
            contribution: total / scale,
        })
        .collect();

    let result = AttributionResult {
        baseline,
        prediction,
        contributions,
        permutations: passes,
        background_rows: n,
    };

    let gap = result.efficiency_gap();
    if gap > config.tolerance * prediction.abs().max(1.0) {
        return Err(unavailable(format!(
            "contributions do not add up: baseline + sum = {}, prediction = {}",
            result.reconstructed(),
            prediction
        )));
    }

    tracing::debug!(baseline, prediction, gap, passes, rows = n, "Attribution computed");
    Ok(result)
}

/// Run the prediction function, rejecting wrong-length or non-finite output
fn call<F>(predict_fn: &F, rows: ArrayView2<'_, f64>) -> PipelineResult<Array1<f64>>
where
    F: Fn(ArrayView2<'_, f64>) -> PipelineResult<Array1<f64>>,
{
    let expected = rows.nrows();
    let out = predict_fn(rows).map_err(|e| unavailable(format!("model call failed: {}", e)))?;

    if out.len() != expected {
        return Err(unavailable(format!(
            "model returned {} values for {} rows",
            out.len(),
            expected
        )));
    }
    if out.iter().any(|v| !v.is_finite()) {
        return Err(unavailable("model returned a non-finite value".to_string()));
    }
    Ok(out)
}

fn unavailable(message: String) -> PipelineError {
    PipelineError::AttributionUnavailable(message)
}

// ============================================================================
// TESTS
// ============================================================================
