//! Feature Record - Core data structure for model input
//!
//! **Versioned feature record with layout validation**
//!
//! Every record carries the layout version and hash it was built against so
//! a record coming from an API client (or an older build) can be rejected
//! before it reaches the model.

use serde::{Deserialize, Serialize};
use super::layout::{
    FEATURE_COUNT, FEATURE_VERSION, FEATURE_LAYOUT,
    layout_hash, validate_layout, LayoutMismatchError,
};

/// Versioned feature record for one property
///
/// Immutable once built: there are no setters, only the builder in
/// `builder.rs` and the raw constructors below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    values: Vec<f64>,
}

impl FeatureRecord {
    /// Create from values stamped with the current layout
    ///
    /// The length is not checked here; `PredictionService` rejects records
    /// whose width differs from the model's.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Create with an explicit layout stamp (replayed or foreign records)
    pub fn with_layout(version: u8, layout_hash: u32, values: Vec<f64>) -> Self {
        Self { version, layout_hash, values }
    }

    /// All-zero record, clamped into every field's range
    ///
    /// Used as a probe input when a model artifact is loaded.
    pub fn probe() -> Self {
        let values = FEATURE_LAYOUT
            .iter()
            .map(|f| f.kind.range().0.max(0.0))
            .collect();
        Self::from_values(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get feature by index
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Get feature by name
    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        super::layout::feature_index(name).and_then(|i| self.get(i))
    }

    /// Validate that this record is compatible with current layout
    pub fn validate(&self) -> Result<(), RecordShapeError> {
        validate_layout(self.version, self.layout_hash)?;
        if self.values.len() != FEATURE_COUNT {
            return Err(RecordShapeError::Width {
                expected: FEATURE_COUNT,
                actual: self.values.len(),
            });
        }
        for (spec, &value) in FEATURE_LAYOUT.iter().zip(&self.values) {
            if !spec.kind.admits(value) {
                return Err(RecordShapeError::Value { field: spec.name, value });
            }
        }
        Ok(())
    }

    /// Check if this record is compatible with current layout
    pub fn is_compatible(&self) -> bool {
        self.validate().is_ok()
    }

    /// Named values, in layout order
    pub fn named_values(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_LAYOUT.iter().map(|f| f.name).zip(self.values.iter().copied())
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": self.named_values()
                .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
                .collect::<serde_json::Map<String, serde_json::Value>>(),
        })
    }
}

/// Why a record cannot be fed to the model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordShapeError {
    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("record has {actual} values, layout expects {expected}")]
    Width { expected: usize, actual: usize },

    #[error("{field}: {value} is not a legal value")]
    Value { field: &'static str, value: f64 },
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::layout::feature_index;

    #[test]
    fn test_from_values_is_stamped() {
        let record = FeatureRecord::from_values(vec![0.0; FEATURE_COUNT]);
        assert_eq!(record.version, FEATURE_VERSION);
        assert_eq!(record.layout_hash, layout_hash());
        assert!(record.is_compatible());
    }

    #[test]
    fn test_missing_field_is_incompatible() {
        let record = FeatureRecord::from_values(vec![0.0; FEATURE_COUNT - 1]);
        assert_eq!(
            record.validate(),
            Err(RecordShapeError::Width { expected: FEATURE_COUNT, actual: FEATURE_COUNT - 1 })
        );
    }

    #[test]
    fn test_foreign_layout_is_incompatible() {
        let record = FeatureRecord::with_layout(FEATURE_VERSION, 0xDEADBEEF, vec![0.0; FEATURE_COUNT]);
        assert!(matches!(record.validate(), Err(RecordShapeError::Layout(_))));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let cases = [("traveler", 500.0), ("traveler", 2.5), ("surface", -300.0), ("wifi", 0.5), ("seaview", f64::NAN)];
        for (name, value) in cases {
            let mut values = FeatureRecord::probe().as_slice().to_vec();
            values[feature_index(name).unwrap()] = value;
            let err = FeatureRecord::from_values(values).validate().unwrap_err();
            assert!(matches!(err, RecordShapeError::Value { field, .. } if field == name), "{} = {}", name, value);
        }
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let mut values = FeatureRecord::probe().as_slice().to_vec();
        values[feature_index("traveler").unwrap()] = 15.0;
        values[feature_index("surface").unwrap()] = 1000.0;
        values[feature_index("wifi").unwrap()] = 1.0;
        assert!(FeatureRecord::from_values(values).is_compatible());
    }

    #[test]
    fn test_probe_is_in_range() {
        let probe = FeatureRecord::probe();
        assert!(probe.is_compatible());
        assert_eq!(probe.get_by_name("traveler"), Some(1.0));
        assert_eq!(probe.get_by_name("surface"), Some(0.0));
    }

    #[test]
    fn test_get_by_name() {
        let mut values = vec![0.0; FEATURE_COUNT];
        values[16] = 45.0;
        let record = FeatureRecord::from_values(values);
        assert_eq!(record.get_by_name("surface"), Some(45.0));
        assert_eq!(record.get_by_name("nonexistent"), None);
    }

    #[test]
    fn test_deserialize_short_record() {
        let json = serde_json::json!({
            "version": FEATURE_VERSION,
            "layout_hash": layout_hash(),
            "values": [1.0, 2.0],
        });
        let record: FeatureRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.len(), 2);
        assert!(!record.is_compatible());
    }

    #[test]
    fn test_to_log_entry() {
        let record = FeatureRecord::probe();
        let log = record.to_log_entry();
        assert_eq!(log["feature_version"], FEATURE_VERSION);
        assert_eq!(log["named_values"]["traveler"], 1.0);
    }
}
