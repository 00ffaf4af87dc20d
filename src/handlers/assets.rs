//! Decorative image handler

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::{AppError, AppResult, AppState};

/// Cover image above the form (`IMAGE_PATH`)
pub async fn cover(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let path = state
        .config
        .image_path
        .as_ref()
        .ok_or_else(|| AppError::NotFound("No image configured".to_string()))?;

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        tracing::warn!("Cannot read image {}: {}", path.display(), e);
        AppError::NotFound("Image not found".to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, content_type(path))], bytes))
}

fn content_type(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
