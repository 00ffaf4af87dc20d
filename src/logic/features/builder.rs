//! Feature Vector Builder - raw form input to FeatureRecord
//!
//! Binary toggles are zero-filled when unset. Numeric fields are required,
//! parsed as `f64` and range-checked against the layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::layout::{FieldKind, FieldSpec, FEATURE_LAYOUT, field};
use super::vector::FeatureRecord;
use crate::error::{PipelineError, PipelineResult};

/// One raw control value as it arrives from the form or the JSON API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Flag(v)
    }
}

/// Raw per-field values keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFeatureInput {
    values: BTreeMap<String, RawValue>,
}

impl RawFeatureInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw value (builder style)
    pub fn with(mut self, name: &str, value: impl Into<RawValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, RawValue)> for RawFeatureInput {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

/// Build one FeatureRecord from raw input
pub fn build_record(raw: &RawFeatureInput) -> PipelineResult<FeatureRecord> {
    if let Some(unknown) = raw.values.keys().find(|name| field(name).is_none()) {
        return Err(PipelineError::InvalidInput(format!("unknown field '{}'", unknown)));
    }

    let values = FEATURE_LAYOUT
        .iter()
        .map(|spec| coerce_field(spec, raw.get(spec.name)))
        .collect::<PipelineResult<Vec<f64>>>()?;

    Ok(FeatureRecord::from_values(values))
}

fn coerce_field(spec: &FieldSpec, value: Option<&RawValue>) -> PipelineResult<f64> {
    match spec.kind {
        FieldKind::Binary => coerce_toggle(spec, value),
        FieldKind::Count { min, max } => {
            let v = parse_number(spec, value)?;
            check_range(spec, v, min, max)?;
            if v.fract() != 0.0 {
                return Err(invalid(spec, format!("must be a whole number, got {}", v)));
            }
            Ok(v)
        }
        FieldKind::Continuous { min, max } => {
            let v = parse_number(spec, value)?;
            check_range(spec, v, min, max)?;
            Ok(v)
        }
    }
}

fn coerce_toggle(spec: &FieldSpec, value: Option<&RawValue>) -> PipelineResult<f64> {
    let set = match value {
        None => false,
        Some(RawValue::Flag(b)) => *b,
        Some(RawValue::Number(n)) if *n == 0.0 => false,
        Some(RawValue::Number(n)) if *n == 1.0 => true,
        Some(RawValue::Number(n)) => {
            return Err(invalid(spec, format!("toggle must be 0 or 1, got {}", n)));
        }
        Some(RawValue::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "off" | "false" | "no" => false,
            "1" | "on" | "true" | "yes" => true,
            other => {
                return Err(invalid(spec, format!("unrecognised toggle value '{}'", other)));
            }
        },
    };
    Ok(if set { 1.0 } else { 0.0 })
}

fn parse_number(spec: &FieldSpec, value: Option<&RawValue>) -> PipelineResult<f64> {
    let v = match value {
        None => return Err(invalid(spec, "is required".to_string())),
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Flag(_)) => {
            return Err(invalid(spec, "expected a number, got a toggle".to_string()));
        }
        Some(RawValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(spec, format!("'{}' is not a number", s)))?,
    };

    if !v.is_finite() {
        return Err(invalid(spec, format!("must be finite, got {}", v)));
    }
    Ok(v)
}

fn check_range(spec: &FieldSpec, v: f64, min: f64, max: f64) -> PipelineResult<()> {
    if v < min || v > max {
        return Err(invalid(spec, format!("{} is outside [{}, {}]", v, min, max)));
    }
    Ok(())
}

fn invalid(spec: &FieldSpec, message: String) -> PipelineError {
    PipelineError::InvalidInput(format!("{}: {}", spec.name, message))
}

// ============================================================================
// TESTS
// ============================================================================
