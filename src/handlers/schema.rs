//! Feature schema handler

use axum::Json;

use crate::logic::features::LayoutInfo;

/// Layout version, hash and fields
pub async fn get() -> Json<LayoutInfo> {
    Json(LayoutInfo::current())
}
