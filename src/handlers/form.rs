//! Form page handlers

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};

use super::blocking;
use crate::logic::features::{RawFeatureInput, RawValue};
use crate::logic::present::{render_page, PageContext};
use crate::logic::RunOptions;
use crate::{AppState, PipelineError};

/// Name of the form toggle asking for an explanation
const EXPLAIN_FIELD: &str = "explain";

/// Shown when the price fails for reasons the user cannot fix
const UNAVAILABLE_MESSAGE: &str = "The price could not be computed right now. Please try again later.";

/// Empty form
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&PageContext {
        show_image: state.config.image_path.is_some(),
        ..PageContext::default()
    }))
}

/// Form submission: price (and explain) the property, then re-render the page
///
/// Always answers with the page; failures are shown above the form.
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<BTreeMap<String, String>>,
) -> Response {
    let explain = form
        .get(EXPLAIN_FIELD)
        .map(|v| !v.is_empty() && v != "0" && v != "off")
        .unwrap_or(false);

    // unchecked boxes are simply absent; the builder zero-fills them
    let input: RawFeatureInput = form
        .iter()
        .filter(|(name, _)| name.as_str() != EXPLAIN_FIELD)
        .map(|(name, value)| (name.clone(), RawValue::Text(value.clone())))
        .collect();

    let options = RunOptions { explain, ..state.pipeline.default_options() };
    let pipeline = state.pipeline.clone();
    let result = blocking(move || pipeline.run(&input, options))
        .await
        .unwrap_or_else(|e| Err(PipelineError::Prediction(format!("{:?}", e))));

    let base = PageContext {
        form_values: Some(&form),
        show_image: state.config.image_path.is_some(),
        explain_checked: explain,
        ..PageContext::default()
    };

    match result {
        Ok(output) => Html(render_page(&PageContext {
            presentation: Some(&output.presentation),
            ..base
        }))
        .into_response(),
        Err(PipelineError::InvalidInput(msg)) => {
            tracing::info!("Rejected form input: {}", msg);
            let page = render_page(&PageContext { error: Some(&msg), ..base });
            (StatusCode::BAD_REQUEST, Html(page)).into_response()
        }
        Err(e) => {
            tracing::error!("Form prediction failed: {}", e);
            let status = match e {
                PipelineError::SchemaMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let page = render_page(&PageContext { error: Some(UNAVAILABLE_MESSAGE), ..base });
            (status, Html(page)).into_response()
        }
    }
}
