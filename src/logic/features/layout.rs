//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! The model artifact, the reference data and every record built from the
//! form are read through this layout. Field order is the column order the
//! regression model was fitted on.
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FIELD KINDS
// ============================================================================

/// How a field is entered and validated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Whole number within an inclusive range (slider in the form)
    Count { min: f64, max: f64 },
    /// Real number within an inclusive range
    Continuous { min: f64, max: f64 },
    /// 0/1 indicator (toggle in the form)
    Binary,
}

impl FieldKind {
    pub fn is_binary(&self) -> bool {
        matches!(self, FieldKind::Binary)
    }

    /// Inclusive value range
    pub fn range(&self) -> (f64, f64) {
        match *self {
            FieldKind::Count { min, max } | FieldKind::Continuous { min, max } => (min, max),
            FieldKind::Binary => (0.0, 1.0),
        }
    }

    /// Whether an already coerced value is legal for this field
    pub fn admits(&self, value: f64) -> bool {
        match *self {
            FieldKind::Binary => value == 0.0 || value == 1.0,
            FieldKind::Count { min, max } => value >= min && value <= max && value.fract() == 0.0,
            FieldKind::Continuous { min, max } => value >= min && value <= max,
        }
    }
}

/// One entry of the layout
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn binary(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { name, label, kind: FieldKind::Binary }
}

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Fields in exact order they appear in the vector
/// This is the SINGLE SOURCE OF TRUTH for feature layout
pub const FEATURE_LAYOUT: &[FieldSpec] = &[
    // === Capacity (0-1) ===
    FieldSpec {
        name: "traveler",
        label: "Number of travelers",
        kind: FieldKind::Count { min: 1.0, max: 15.0 },
    },
    FieldSpec {
        name: "bathroom",
        label: "Number of bathrooms",
        kind: FieldKind::Count { min: 0.0, max: 10.0 },
    },

    // === Amenities (2-15) ===
    binary("free_parking_on_site", "Free parking on site"),
    binary("free_street_parking", "Free parking on street"),
    binary("heating", "Heating"),
    binary("seaview", "Seaview"),
    binary("AC", "AC (climatisation)"),
    binary("wifi", "Wifi"),
    binary("accepted_animals", "Accepted animals"),
    binary("tv", "TV"),
    binary("microwave_oven", "Microwave oven"),
    binary("smoker", "Smoker"),
    binary("backyard", "Backyard"),
    binary("workspace", "Workspace"),
    binary("private_garden", "Private garden"),
    binary("swimming_pool", "Swimming pool"),

    // === Size (16) ===
    FieldSpec {
        name: "surface",
        label: "Surface (m2)",
        kind: FieldKind::Continuous { min: 0.0, max: 1000.0 },
    },

    // === Location (17) ===
    binary("transport_access", "Transport access"),
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 18;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches at runtime
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    // Include version in hash
    hasher.update(&[FEATURE_VERSION]);

    // Hash all feature names in order
    for field in FEATURE_LAYOUT {
        hasher.update(field.name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Serializable view of one field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
}

/// Complete layout information for the schema endpoint and logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub fields: Vec<FieldInfo>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            fields: FEATURE_LAYOUT
                .iter()
                .map(|f| FieldInfo {
                    name: f.name.to_string(),
                    label: f.label.to_string(),
                    kind: f.kind,
                })
                .collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when feature layout doesn't match expected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), \
     got v{actual_version} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

/// Check that a list of column names is exactly the layout, in order
pub fn matches_layout<S: AsRef<str>>(names: &[S]) -> bool {
    names.len() == FEATURE_COUNT
        && names
            .iter()
            .zip(FEATURE_LAYOUT)
            .all(|(name, field)| name.as_ref() == field.name)
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|f| f.name == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).map(|f| f.name)
}

/// Get the full field spec by name
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FEATURE_LAYOUT.iter().find(|f| f.name == name)
}

/// Names in layout order
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FEATURE_LAYOUT.iter().map(|f| f.name)
}

// ============================================================================
// TESTS
// ============================================================================
