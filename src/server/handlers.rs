//! HTTP request handlers

use super::{
    error::{Result, ServerError},
    state::AppState,
};
use crate::training::{EvaluationReport, ModelKind};
use crate::utils::frame_to_records;
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

const DEFAULT_CHOICE: &str = "random_forest";

pub async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Vec<Map<String, Value>>>> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut choice: Option<String> = None;
    let mut sample_size: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| ServerError::BadRequest(e.to_string()))? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.csv").to_string();
                let data = field.bytes().await.map_err(|e| ServerError::BadRequest(e.to_string()))?;
                upload = Some((file_name, data));
            }
            "choice" => {
                choice = Some(field.text().await.map_err(|e| ServerError::BadRequest(e.to_string()))?);
            }
            "sample_size" => {
                sample_size = Some(field.text().await.map_err(|e| ServerError::BadRequest(e.to_string()))?);
            }
            _ => {}
        }
    }

    // Reject a bad choice before touching the filesystem
    let kind: ModelKind = choice.as_deref().unwrap_or(DEFAULT_CHOICE).parse()?;

    let sample_size = match sample_size {
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ServerError::BadRequest(format!(
                    "sample_size must be a positive integer, got '{}'",
                    raw
                )))
            }
        },
        None => state.config.default_sample_size,
    };

    let (file_name, data) = upload.ok_or_else(|| ServerError::BadRequest("No file uploaded".to_string()))?;
    info!(file = %file_name, bytes = data.len(), model = %kind, sample_size, "Received prediction request");

    let service = state.service.clone();
    let upload_dir = state.config.upload_dir.clone();
    let records = tokio::task::spawn_blocking(move || -> Result<Vec<Map<String, Value>>> {
        // Removed on drop, whichever way this closure exits
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".csv")
            .tempfile_in(&upload_dir)?;
        file.write_all(&data)?;
        file.flush()?;

        let output = service.predict_file(file.path(), kind.as_str(), Some(sample_size))?;
        Ok(frame_to_records(&output.frame)?)
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(records))
}

pub async fn evaluate(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, EvaluationReport>>> {
    let service = state.service.clone();
    let reports = tokio::task::spawn_blocking(move || service.evaluate())
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
    Ok(Json(reports))
}

pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
