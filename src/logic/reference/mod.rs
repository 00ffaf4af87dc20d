//! Reference Module - Background Reference Set
//!
//! A fixed sample of historical properties, read once at start-up and shared
//! read-only by every attribution request.

pub mod loader;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::{rngs::StdRng, SeedableRng};

use crate::error::{PipelineError, PipelineResult};
use crate::logic::features::{FeatureRecord, FEATURE_COUNT};

pub use loader::{load_reference, load_reference_from_reader};

/// Background rows in layout order
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSet {
    rows: Array2<f64>,
}

impl ReferenceSet {
    /// Wrap a matrix whose columns follow the layout
    pub fn new(rows: Array2<f64>) -> PipelineResult<Self> {
        if rows.ncols() != FEATURE_COUNT {
            return Err(PipelineError::ReferenceData(format!(
                "reference rows have {} columns, layout has {}",
                rows.ncols(),
                FEATURE_COUNT
            )));
        }
        Ok(Self { rows })
    }

    pub fn empty() -> Self {
        Self { rows: Array2::zeros((0, FEATURE_COUNT)) }
    }

    /// Build from already validated records
    pub fn from_records(records: &[FeatureRecord]) -> PipelineResult<Self> {
        let mut rows = Array2::zeros((0, FEATURE_COUNT));
        for record in records {
            record
                .validate()
                .map_err(|e| PipelineError::ReferenceData(e.to_string()))?;
            rows.push_row(ArrayView1::from(record.as_slice()))
                .map_err(|e| PipelineError::ReferenceData(e.to_string()))?;
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> ArrayView2<'_, f64> {
        self.rows.view()
    }

    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    /// Keep at most `max_rows` rows, chosen uniformly with a fixed seed
    ///
    /// Attribution cost grows linearly with the background size.
    pub fn subsample(self, max_rows: usize, seed: u64) -> Self {
        if max_rows == 0 || self.len() <= max_rows {
            return self;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked = rand::seq::index::sample(&mut rng, self.len(), max_rows).into_vec();
        picked.sort_unstable();

        tracing::debug!(from = self.len(), to = max_rows, "Subsampling reference set");
        Self { rows: self.rows.select(Axis(0), &picked) }
    }
}
