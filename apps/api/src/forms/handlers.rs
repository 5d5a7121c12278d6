//! Axum route handler for the form-filling API.

use axum::{body::Bytes, extract::State, Json};
use tracing::info;

use crate::errors::AppError;
use crate::forms::filler::{fill_grant_form, FillGrantFormRequest, FillGrantFormResponse, FillInput};
use crate::request::{parse_json_body, BODY_REQUIRED};
use crate::state::AppState;

/// POST /api/fillgrantform
///
/// Fills a grant application PDF. Works without an LLM, using demo text.
pub async fn handle_fill_grant_form(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<FillGrantFormResponse>, AppError> {
    info!("FillGrantForm triggered");

    let request: FillGrantFormRequest = parse_json_body(&body, BODY_REQUIRED)?;
    let input = FillInput::from_request(request)
        .ok_or_else(|| AppError::Validation("pdf_data is required".to_string()))?;

    let response = fill_grant_form(state.llm.as_ref(), input).await;
    info!(
        "FillGrantForm completed: {} responses",
        response.filled_responses.len()
    );
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use wiremock::MockServer;

    use crate::forms::pdf::test_support::{acroform_pdf, text_pdf};
    use crate::forms::pdf::{self, encode_base64};
    use crate::llm_client::test_support::{mount_reply, test_client};
    use crate::routes::test_support::{post_json, request_raw};
    use crate::state::test_support::bare_state;
    use crate::state::AppState;

    const URI: &str = "/api/fillgrantform";

    #[tokio::test]
    async fn test_empty_body_rejected() {
        let (status, body) = request_raw(bare_state(), Method::POST, URI, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Request body is required");
    }

    #[tokio::test]
    async fn test_missing_pdf_data_rejected() {
        let (status, body) =
            post_json(bare_state(), URI, json!({"ngo_profile": {"mission": "x"}})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "pdf_data is required");
    }

    #[tokio::test]
    async fn test_fillable_form_without_llm() {
        let source = acroform_pdf(&[("organization_name", ""), ("project_title", ""), ("signatory", "")]);
        let (status, body) = post_json(
            bare_state(),
            URI,
            json!({
                "pdf_data": encode_base64(&source),
                "ngo_profile": {"organization_name": "Hope Works"},
                "grant_context": {"funder_name": "Gates", "max_amount": 75000}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["original_fields"].as_array().unwrap().len(), 3);
        assert_eq!(body["classified_fields"]["organizational"][0]["name"], "organization_name");
        assert_eq!(body["classified_fields"]["other"][0]["name"], "signatory");
        assert_eq!(body["filled_responses"]["organization_name"], "Hope Works");
        assert_eq!(body["filled_responses"]["signatory"], "[Please provide Signatory]");
        assert_eq!(body["processing_summary"]["pdf_generation"]["method"], "form_fields");
        assert_eq!(body["processing_summary"]["fill_rate"], 100.0);
        assert_eq!(body["pdf_analysis"]["has_form_fields"], true);
        assert_eq!(body["enhanced_profile"]["data_sources_used"], json!(["manual_entry"]));
        assert_eq!(body["filled_pdf"]["encoding"], "base64");

        let filled = pdf::decode_base64(body["filled_pdf"]["data"].as_str().unwrap()).unwrap();
        let doc = pdf::load(&filled).unwrap();
        let fields = pdf::text_fields(&doc);
        assert_eq!(fields[0].value, "Hope Works");
    }

    #[tokio::test]
    async fn test_plain_form_with_llm_generates_document() {
        let server = MockServer::start().await;
        mount_reply(&server, "Drafted answer").await;
        let state = AppState {
            llm: Some(test_client(&server)),
            ..bare_state()
        };
        let source = text_pdf(&["Project Title", "Project Description"]);

        let (status, body) =
            post_json(state, URI, json!({"pdf_data": encode_base64(&source)})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filled_responses"]["project_title"], "Drafted answer");
        assert_eq!(body["filled_responses"]["project_description"], "Drafted answer");
        assert_eq!(body["original_fields"][0]["inferred"], true);
        assert_eq!(body["processing_summary"]["pdf_generation"]["method"], "generated");
        assert_eq!(body["pdf_analysis"]["total_pages"], 1);
        assert!(body["timestamp"].as_str().is_some());
    }
}
