use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use cnis_parsing::ParsingError;

use crate::models::{ApiError, ProcessRequest, ProcessResponse};
use crate::state::AppState;
use crate::upload;

/// `POST /processar_cnis`: parse statement text sent as `{"texto": ...}`.
pub async fn process_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let bytes = request.texto.len();

    // Large statements take a while; keep them off the async workers
    let worker_state = Arc::clone(&state);
    let resultado = tokio::task::spawn_blocking(move || {
        worker_state.extractor.validate_input(&request.texto)?;
        Ok::<_, ParsingError>(worker_state.extractor.parse(&request.texto))
    })
    .await
    .map_err(|e| ApiError::internal(format!("Task join error: {}", e)))??;

    tracing::info!(
        bytes,
        records = resultado.vinculos.len(),
        "processed statement text"
    );
    Ok(Json(ProcessResponse::success(resultado)))
}

/// `POST /processar_cnis/pdf`: multipart upload with the statement in the `pdf` field.
pub async fn process_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let upload = upload::parse_multipart(multipart)
        .await
        .map_err(ApiError::bad_request)?;

    // Temp dir is removed on drop
    let temp_dir = tempfile::tempdir()
        .map_err(|e| ApiError::internal(format!("Failed to create temp directory: {}", e)))?;
    let pdf_path = temp_dir.path().join("upload.pdf");
    std::fs::write(&pdf_path, &upload.data)
        .map_err(|e| ApiError::internal(format!("Failed to write temp file: {}", e)))?;

    // MuPDF is blocking
    let worker_state = Arc::clone(&state);
    let (resultado, stats) = tokio::task::spawn_blocking(move || {
        worker_state
            .extractor
            .extract_via_backend(&pdf_path, &worker_state.backend)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Task join error: {}", e)))??;
    drop(temp_dir);

    tracing::info!(
        file = %upload.filename,
        records = resultado.vinculos.len(),
        triggers = stats.triggers,
        "processed uploaded statement"
    );
    Ok(Json(ProcessResponse::success(resultado)))
}
