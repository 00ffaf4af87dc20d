//! Features Module - Feature Schema and Record Building
//!
//! The layout is the contract shared by the model artifact, the reference
//! data and every record built from user input.

pub mod layout;
pub mod vector;
pub mod builder;


// Re-export common types
pub use layout::{FieldKind, FieldSpec, LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use vector::{FeatureRecord, RecordShapeError};
pub use builder::{build_record, RawFeatureInput, RawValue};
