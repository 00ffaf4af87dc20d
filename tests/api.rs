//! Integration test: form page, JSON API and start-up failures

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use marseille_rent::config::Config;
use marseille_rent::logic::features::layout::{feature_index, feature_names};
use marseille_rent::logic::features::FEATURE_COUNT;
use marseille_rent::logic::model::{
    InferenceError, JsonArtifact, LinearModel, ModelKind, PredictionService, PriceModel,
};
use marseille_rent::logic::reference::ReferenceSet;
use marseille_rent::logic::Pipeline;
use marseille_rent::{create_router, AppState, PipelineError};
use ndarray::{Array1, ArrayView2};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const INTERCEPT: f64 = 20.0;

fn coefficients() -> Vec<f64> {
    let mut coefficients = vec![0.0; FEATURE_COUNT];
    coefficients[feature_index("traveler").unwrap()] = 6.0;
    coefficients[feature_index("bathroom").unwrap()] = 9.0;
    coefficients[feature_index("surface").unwrap()] = 0.9;
    coefficients[feature_index("seaview").unwrap()] = 25.0;
    coefficients[feature_index("AC").unwrap()] = 8.0;
    coefficients[feature_index("swimming_pool").unwrap()] = 40.0;
    coefficients
}

fn write_model(dir: &Path) -> std::path::PathBuf {
    let model = LinearModel::new(feature_names().map(String::from).collect(), coefficients(), INTERCEPT).unwrap();
    let path = dir.join("reg_model.json");
    std::fs::write(&path, serde_json::to_vec(&JsonArtifact::Linear(model)).unwrap()).unwrap();
    path
}

fn write_reference(dir: &Path) -> std::path::PathBuf {
    let mut header: Vec<&str> = feature_names().collect();
    header.push("price");

    let mut lines = vec![header.join(";")];
    for (traveler, bathroom, surface, seaview, ac) in
        [(2, 1, 35, 0, 1), (4, 1, 70, 1, 0), (6, 2, 110, 0, 1), (3, 1, 48, 1, 1)]
    {
        let mut row: Vec<String> = feature_names()
            .map(|name| match name {
                "traveler" => traveler.to_string(),
                "bathroom" => bathroom.to_string(),
                "surface" => surface.to_string(),
                "seaview" => seaview.to_string(),
                "AC" => ac.to_string(),
                _ => "0".to_string(),
            })
            .collect();
        row.push("99".to_string());
        lines.push(row.join(";"));
    }

    let path = dir.join("reference.csv");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn test_config(dir: &Path) -> Config {
    Config {
        model_path: write_model(dir),
        reference_path: write_reference(dir),
        ..Config::default()
    }
}

fn test_app() -> (TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::load(test_config(dir.path())).unwrap();
    (dir, create_router(state))
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post_form(app: axum::Router, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, String::from_utf8(bytes).unwrap())
}

fn scenario_price() -> f64 {
    INTERCEPT + 6.0 * 2.0 + 9.0 * 1.0 + 0.9 * 45.0
}

// ============================================================================
// JSON API
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (_dir, app) = test_app();
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_schema_lists_all_fields() {
    let (_dir, app) = test_app();
    let (status, body) = get(app, "/api/v1/schema").await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["feature_count"], 18);
    assert_eq!(body["fields"][0]["name"], "traveler");
    assert_eq!(body["fields"][2]["kind"]["type"], "binary");
}

#[tokio::test]
async fn test_predict_scenario_with_explanation() {
    let (_dir, app) = test_app();
    let (status, body) = post_json(
        app,
        "/api/v1/predict",
        json!({
            "fields": {"traveler": 2, "bathroom": 1, "surface": 45.0},
            "explain": true
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let prediction = body["prediction"].as_f64().unwrap();
    assert!((prediction - scenario_price()).abs() < 1e-9);
    assert_eq!(body["presentation"]["prediction"].as_f64().unwrap(), prediction);

    let baseline = body["attribution"]["baseline"].as_f64().unwrap();
    let total: f64 = body["attribution"]["contributions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["contribution"].as_f64().unwrap())
        .sum();
    assert!((baseline + total - prediction).abs() <= 1e-4 * prediction);

    let steps = body["presentation"]["waterfall"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), FEATURE_COUNT);
    let first = steps[0]["contribution"].as_f64().unwrap().abs();
    let second = steps[1]["contribution"].as_f64().unwrap().abs();
    assert!(first >= second);
}

#[tokio::test]
async fn test_predict_is_deterministic() {
    let (_dir, app) = test_app();
    let body = json!({"fields": {"traveler": 5, "bathroom": 2, "surface": "120", "seaview": "on"}});

    let (_, a) = post_json(app.clone(), "/api/v1/predict", body.clone()).await;
    let (_, b) = post_json(app, "/api/v1/predict", body).await;
    assert_eq!(a["prediction"], b["prediction"]);
}

#[tokio::test]
async fn test_predict_rejects_non_numeric_surface() {
    let (_dir, app) = test_app();
    let (status, body) = post_json(
        app,
        "/api/v1/predict",
        json!({"fields": {"traveler": 2, "bathroom": 1, "surface": "large"}}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("surface"));
}

#[tokio::test]
async fn test_predict_rejects_bad_top_n() {
    let (_dir, app) = test_app();
    let (status, _) = post_json(
        app,
        "/api/v1/predict",
        json!({"fields": {"traveler": 2, "bathroom": 1, "surface": 45}, "top_n": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_record_missing_field_is_schema_mismatch() {
    let (_dir, app) = test_app();
    let layout = marseille_rent::logic::features::LayoutInfo::current();
    let (status, body) = post_json(
        app,
        "/api/v1/predict/record",
        json!({
            "version": layout.version,
            "layout_hash": layout.hash,
            "values": vec![1.0; FEATURE_COUNT - 1],
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
}

#[tokio::test]
async fn test_record_out_of_range_is_rejected() {
    let (_dir, app) = test_app();
    let layout = marseille_rent::logic::features::LayoutInfo::current();
    let mut values = vec![0.0; FEATURE_COUNT];
    values[feature_index("traveler").unwrap()] = 500.0;
    values[feature_index("bathroom").unwrap()] = 1.0;
    values[feature_index("surface").unwrap()] = -300.0;
    values[feature_index("wifi").unwrap()] = 0.5;

    let (status, body) = post_json(
        app,
        "/api/v1/predict/record",
        json!({"version": layout.version, "layout_hash": layout.hash, "values": values}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("traveler"));
}

#[tokio::test]
async fn test_record_endpoint_predicts_full_record() {
    let (_dir, app) = test_app();
    let layout = marseille_rent::logic::features::LayoutInfo::current();
    let mut values = vec![0.0; FEATURE_COUNT];
    values[feature_index("traveler").unwrap()] = 2.0;
    values[feature_index("bathroom").unwrap()] = 1.0;
    values[feature_index("surface").unwrap()] = 45.0;

    let (status, body) = post_json(
        app,
        "/api/v1/predict/record?explain=true&top_n=3",
        json!({"version": layout.version, "layout_hash": layout.hash, "values": values}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!((body["prediction"].as_f64().unwrap() - scenario_price()).abs() < 1e-9);
    assert_eq!(body["presentation"]["waterfall"]["steps"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_status_reports_model_and_reference() {
    let (_dir, app) = test_app();
    let (status, body) = get(app, "/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["engine"]["model_loaded"], true);
    assert_eq!(body["engine"]["model"]["model_kind"], "linear");
    assert_eq!(body["reference_rows"], 4);
}

// ============================================================================
// Form page
// ============================================================================

#[tokio::test]
async fn test_index_has_form() {
    let (_dir, app) = test_app();
    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);

    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("<form method=\"post\" action=\"/predict\">"));
    assert!(html.contains("name=\"transport_access\""));
    assert!(!html.contains("/assets/cover"));
}

#[tokio::test]
async fn test_form_submit_shows_price_and_waterfall() {
    let (_dir, app) = test_app();
    let (status, html) = post_form(app, "traveler=2&bathroom=1&surface=45&explain=1").await;

    assert_eq!(status, StatusCode::OK);
    let headline = format!("<strong>{:.2} €</strong>", scenario_price());
    assert!(html.contains(&headline), "{}", html);
    assert!(html.contains("class=\"waterfall\""));
    assert!(html.contains("name=\"explain\" value=\"1\" checked"));
}

#[tokio::test]
async fn test_form_submit_without_explain() {
    let (_dir, app) = test_app();
    let (status, html) = post_form(app, "traveler=4&bathroom=2&surface=80&wifi=1&seaview=1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Predicted nightly price"));
    assert!(!html.contains("class=\"waterfall\""));
}

#[tokio::test]
async fn test_form_submit_invalid_reprompts() {
    let (_dir, app) = test_app();
    let (status, html) = post_form(app, "traveler=2&bathroom=1&surface=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("surface"));
    assert!(html.contains("value=\"abc\""));
    assert!(!html.contains("class=\"result\""));
}

/// Finite on the probe record, NaN once the surface exceeds 500 m²
struct FragileModel(Vec<String>);

impl PriceModel for FragileModel {
    fn name(&self) -> &str {
        "fragile"
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Custom
    }

    fn feature_names(&self) -> &[String] {
        &self.0
    }

    fn predict_batch(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, InferenceError> {
        let surface = feature_index("surface").unwrap();
        Ok(rows.column(surface).mapv(|s| if s > 500.0 { f64::NAN } else { 2.0 * s + 30.0 }))
    }
}

#[tokio::test]
async fn test_form_model_failure_renders_page() {
    let model = FragileModel(feature_names().map(String::from).collect());
    let service = PredictionService::new(Arc::new(model), "fragile").unwrap();
    let pipeline = Pipeline::new(Arc::new(service), Arc::new(ReferenceSet::empty()));
    let app = create_router(AppState::new(pipeline, Config::default()));

    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("traveler=2&bathroom=1&surface=800"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "{}", content_type);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("could not be computed"));
    assert!(html.contains("value=\"800\""));
    assert!(!html.contains("NaN"));

    // the same form still prices a smaller property
    let (status, html) = post_form(app, "traveler=2&bathroom=1&surface=100").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<strong>230.00 €</strong>"));
}

#[tokio::test]
async fn test_cover_not_configured() {
    let (_dir, app) = test_app();
    let (status, _) = get(app, "/assets/cover").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cover_served_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("marseille_port.jpg");
    std::fs::write(&image, [0xFFu8, 0xD8, 0xFF]).unwrap();

    let config = Config {
        image_path: Some(image),
        ..test_config(dir.path())
    };
    let app = create_router(AppState::load(config).unwrap());

    let (status, body) = get(app.clone(), "/assets/cover").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, vec![0xFF, 0xD8, 0xFF]);

    let (_, index) = get(app, "/").await;
    assert!(String::from_utf8(index).unwrap().contains("/assets/cover"));
}

// ============================================================================
// Start-up failures
// ============================================================================

#[test]
fn test_missing_model_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        model_path: dir.path().join("absent.json"),
        ..test_config(dir.path())
    };
    assert!(matches!(AppState::load(config), Err(PipelineError::ModelLoad(_))));
}

#[test]
fn test_bad_reference_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("bad.csv");
    std::fs::write(&reference, "traveler;bathroom\n2;1\n").unwrap();

    let config = Config {
        reference_path: reference,
        ..test_config(dir.path())
    };
    assert!(matches!(AppState::load(config), Err(PipelineError::ReferenceData(_))));
}

#[test]
fn test_checksum_mismatch_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        model_sha256: Some("deadbeef".to_string()),
        ..test_config(dir.path())
    };
    assert!(matches!(AppState::load(config), Err(PipelineError::ModelLoad(_))));
}
