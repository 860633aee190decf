//! Integration test: Server API endpoints

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use flight_delay::preprocessing::schema::{PART_OF_DAY, PREDICTED_DEP_DEL15};
use flight_delay::server::{create_router, AppState, ServerConfig};
use flight_delay::store::ArtifactStore;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "flight-delay-test-boundary";

fn test_app(store: ArtifactStore) -> axum::Router {
    test_app_with_uploads(store, std::env::temp_dir())
}

fn test_app_with_uploads(store: ArtifactStore, upload_dir: PathBuf) -> axum::Router {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origin: "http://localhost:5173".to_string(),
        max_upload_size: 10 * 1024 * 1024,
        default_sample_size: 3000,
        upload_dir,
        store,
    };
    let state = Arc::new(AppState::new(config.clone()));
    create_router(state, &config)
}

/// multipart/form-data body with an optional CSV file and text fields
fn multipart_body(csv: Option<&str>, fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some(csv) = csv {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"flights.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn predict_request(csv: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(csv, fields)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn trained(root: &Path) -> ArtifactStore {
    common::trained_store(root, 300)
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(ArtifactStore::under(dir.path()))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(ArtifactStore::under(dir.path()))
        .oneshot(Request::builder().uri("/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn test_predict_random_forest_returns_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let store = trained(dir.path());
    let csv = common::raw_csv(100);

    let response = test_app(store.clone())
        .oneshot(predict_request(Some(&csv), &[("choice", "random_forest")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rows = json_body(response).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 100);
    for row in rows {
        let prediction = row[PREDICTED_DEP_DEL15].as_i64().unwrap();
        assert!(prediction == 0 || prediction == 1);
        assert!(row.get(PART_OF_DAY).is_some());
    }

    let written = store.predictions_path("random_forest".parse().unwrap());
    assert!(written.exists());
}

#[tokio::test]
async fn test_predict_defaults_and_sampling() {
    let dir = tempfile::tempdir().unwrap();
    let store = trained(dir.path());
    let csv = common::raw_csv(80);

    // no choice field: random forest
    let response = test_app(store.clone())
        .oneshot(predict_request(Some(&csv), &[("sample_size", "25")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 25);

    let response = test_app(store)
        .oneshot(predict_request(Some(&csv), &[("choice", "k_nearest_neighbor")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 80);
}

#[tokio::test]
async fn test_predict_unknown_choice_is_bad_request() {
    // nothing trained: an unknown choice must still be a 400, not a 404
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(ArtifactStore::under(dir.path()))
        .oneshot(predict_request(Some(&common::raw_csv(5)), &[("choice", "svm")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().unwrap().contains("svm"));
}

#[tokio::test]
async fn test_predict_missing_artifacts_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(ArtifactStore::under(dir.path()))
        .oneshot(predict_request(Some(&common::raw_csv(5)), &[("choice", "gradient_boosting")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_predict_bad_input_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let store = trained(dir.path());

    // no file
    let response = test_app(store.clone())
        .oneshot(predict_request(None, &[("choice", "random_forest")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // zero sample size
    let response = test_app(store.clone())
        .oneshot(predict_request(Some(&common::raw_csv(5)), &[("sample_size", "0")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // required column missing
    let csv = common::raw_csv_with(5, &["MONTH", "DEP_TIME_BLK", "PRCP"]);
    let response = test_app(store)
        .oneshot(predict_request(Some(&csv), &[("choice", "random_forest")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("AIRPORT_FLIGHTS_MONTH"));
}

#[tokio::test]
async fn test_evaluate_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = trained(dir.path());

    let response = test_app(store)
        .oneshot(Request::builder().uri("/evaluate").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let models = body.as_object().unwrap();
    assert_eq!(models.len(), 4);

    let forest = &models["Random Forest"];
    let accuracy = forest["accuracy"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&accuracy));

    let report = &forest["classification_report"];
    let matrix = forest["confusion_matrix"].as_array().unwrap();
    for (row, label) in matrix.iter().zip(["0", "1"]) {
        let row_sum: u64 = row.as_array().unwrap().iter().map(|v| v.as_u64().unwrap()).sum();
        assert_eq!(row_sum, report[label]["support"].as_u64().unwrap());
    }
    assert!(report["macro avg"]["f1-score"].is_number());
    assert!(report["weighted avg"].is_object());
}

#[tokio::test]
async fn test_evaluate_without_artifacts_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let response = test_app(ArtifactStore::under(dir.path()))
        .oneshot(Request::builder().uri("/evaluate").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_upload_removed_after_failed_and_successful_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let store = trained(dir.path());
    let uploads = dir.path().join("uploads");
    std::fs::create_dir_all(&uploads).unwrap();

    // fails after the upload is written: required columns missing
    let csv = common::raw_csv_with(5, &["MONTH", "DEP_TIME_BLK", "PRCP"]);
    let response = test_app_with_uploads(store.clone(), uploads.clone())
        .oneshot(predict_request(Some(&csv), &[("choice", "random_forest")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(dir_entries(&uploads), 0);

    // fails in the model lookup after the upload is written
    std::fs::remove_file(store.model_path("gradient_boosting".parse().unwrap())).unwrap();
    let response = test_app_with_uploads(store.clone(), uploads.clone())
        .oneshot(predict_request(Some(&common::raw_csv(5)), &[("choice", "gradient_boosting")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(dir_entries(&uploads), 0);

    let response = test_app_with_uploads(store, uploads.clone())
        .oneshot(predict_request(Some(&common::raw_csv(10)), &[("choice", "log_reg")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(dir_entries(&uploads), 0);
}
