//! Delimited reference data loader
//!
//! One header row, one column per layout field (any order). Extra columns
//! such as the training price label are ignored.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use ndarray::Array2;

use super::ReferenceSet;
use crate::error::{PipelineError, PipelineResult};
use crate::logic::features::{FEATURE_COUNT, FEATURE_LAYOUT};

/// Load the reference set from a delimited file
pub fn load_reference(path: &Path, delimiter: u8) -> PipelineResult<ReferenceSet> {
    tracing::info!("Loading reference data from: {}", path.display());

    let file = std::fs::File::open(path)
        .map_err(|e| PipelineError::ReferenceData(format!("cannot open {}: {}", path.display(), e)))?;
    let set = load_reference_from_reader(file, delimiter)?;

    tracing::info!(rows = set.len(), "Reference data loaded");
    Ok(set)
}

/// Load the reference set from any reader
pub fn load_reference_from_reader<R: Read>(reader: R, delimiter: u8) -> PipelineResult<ReferenceSet> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::ReferenceData(format!("cannot read header: {}", e)))?
        .clone();

    // Column index in the file for each layout field
    let mut missing = Vec::new();
    let columns: Vec<usize> = FEATURE_LAYOUT
        .iter()
        .filter_map(|spec| {
            let idx = headers.iter().position(|h| h == spec.name);
            if idx.is_none() {
                missing.push(spec.name);
            }
            idx
        })
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::ReferenceData(format!(
            "missing schema columns: {}",
            missing.join(", ")
        )));
    }

    let extra: Vec<&str> = headers
        .iter()
        .filter(|h| !FEATURE_LAYOUT.iter().any(|spec| spec.name == *h))
        .collect();
    if !extra.is_empty() {
        tracing::warn!(columns = ?extra, "Ignoring non-schema reference columns");
    }

    let mut values = Vec::new();
    let mut n_rows = 0usize;

    for (line, result) in rdr.records().enumerate() {
        // header is line 1
        let line = line + 2;
        let record = result
            .map_err(|e| PipelineError::ReferenceData(format!("line {}: {}", line, e)))?;

        for (spec, &col) in FEATURE_LAYOUT.iter().zip(&columns) {
            let cell = record.get(col).unwrap_or("");
            let value: f64 = cell.parse().map_err(|_| {
                PipelineError::ReferenceData(format!(
                    "line {}: column '{}' has non-numeric value '{}'",
                    line, spec.name, cell
                ))
            })?;

            if !value.is_finite() {
                return Err(PipelineError::ReferenceData(format!(
                    "line {}: column '{}' is not finite",
                    line, spec.name
                )));
            }
            if spec.kind.is_binary() && value != 0.0 && value != 1.0 {
                return Err(PipelineError::ReferenceData(format!(
                    "line {}: binary column '{}' has value {}",
                    line, spec.name, value
                )));
            }
            values.push(value);
        }
        n_rows += 1;
    }

    if n_rows == 0 {
        return Err(PipelineError::ReferenceData("reference data has no rows".to_string()));
    }

    let rows = Array2::from_shape_vec((n_rows, FEATURE_COUNT), values)
        .map_err(|e| PipelineError::ReferenceData(e.to_string()))?;
    ReferenceSet::new(rows)
}
