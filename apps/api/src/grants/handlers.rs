//! Axum route handlers for the grant analysis API.

use axum::{body::Bytes, extract::State, Json};
use tracing::info;

use crate::errors::AppError;
use crate::grants::analyzer::{analyze_grant, AnalyzeGrantRequest, AnalyzeGrantResponse, GrantInput};
use crate::request::{parse_json_body, BODY_REQUIRED};
use crate::state::AppState;

/// POST /api/analyzegrant
///
/// Analyzes a grant opportunity with the LLM and stores it as an active grant.
pub async fn handle_analyze_grant(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalyzeGrantResponse>, AppError> {
    info!("AnalyzeGrant triggered");

    let request: AnalyzeGrantRequest = parse_json_body(&body, BODY_REQUIRED)?;
    let input = GrantInput::from_request(request)
        .ok_or_else(|| AppError::Validation("grantDescription is required".to_string()))?;

    let llm = state.llm()?;
    let store = state.documents()?;

    Ok(Json(analyze_grant(llm, store, input).await?))
}
