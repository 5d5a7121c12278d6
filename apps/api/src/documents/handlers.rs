//! Axum route handlers for the document processing API.

use axum::{body::Bytes, extract::State, Json};
use tracing::info;

use crate::documents::processor::{
    process_document, DocumentInput, ProcessDocumentRequest, ProcessDocumentResponse,
};
use crate::errors::AppError;
use crate::request::{parse_json_body, BODY_REQUIRED};
use crate::state::AppState;

/// POST /api/processdocument
pub async fn handle_process_document(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ProcessDocumentResponse>, AppError> {
    info!("ProcessDocument triggered");

    let request: ProcessDocumentRequest = parse_json_body(&body, BODY_REQUIRED)?;
    let input = DocumentInput::from_request(request).ok_or_else(|| {
        AppError::Validation("documentContent and fileName are required".to_string())
    })?;

    let llm = state.llm()?;
    let blobs = state.blobs()?;
    let store = state.documents()?;

    Ok(Json(process_document(llm, blobs, store, input).await?))
}
