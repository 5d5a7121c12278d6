//! Axum route handlers for the tokenizer API.

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::request::{non_blank, parse_json_body};
use crate::state::AppState;
use crate::tokenizer::{tokenize_text, TokenizeOptions};

const BODY_MUST_BE_JSON: &str = "Request body must be JSON";

#[derive(Debug, Deserialize)]
pub struct TokenizeRequest {
    pub text: Option<String>,
    pub model_name: Option<String>,
    pub model: Option<String>,
    pub return_tokens: Option<bool>,
    pub return_token_ids: Option<bool>,
    pub options: Option<RequestOptions>,
}

/// The nested `options` object of a tokenize request.
#[derive(Debug, Default, Deserialize)]
pub struct RequestOptions {
    pub add_special_tokens: Option<bool>,
    pub include_decoded: Option<bool>,
}

/// GET /api/tokenizerfunction
pub async fn handle_tokenizer_info(State(state): State<AppState>) -> Json<Value> {
    info!("Tokenizer info requested");
    Json(json!({
        "message": "Simple Tokenizer API is running",
        "status": "healthy",
        "default_model": state.config.default_model,
        "supported_methods": ["GET", "POST"],
        "usage": {
            "POST": {
                "text": "Text to tokenize (required)",
                "model_name": "Model name (optional)",
                "return_tokens": "Include tokens in the response (default true)",
                "return_token_ids": "Include token ids in the response (default true)",
                "options": {
                    "add_special_tokens": "Wrap the sequence in <BOS>/<EOS> (default false)",
                    "include_decoded": "Include decoded_text in the response (default false)",
                },
            }
        },
    }))
}

/// POST /api/tokenizerfunction
///
/// Tokenizes `text` with the requested model's tokenizer. An unusable model
/// name is reported in the body with `success: false`.
pub async fn handle_tokenize(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    info!("Tokenizer triggered");

    let request: TokenizeRequest = parse_json_body(&body, BODY_MUST_BE_JSON)?;
    let text = request
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Text parameter is required".to_string()))?;
    let model = non_blank(request.model_name)
        .or_else(|| non_blank(request.model))
        .unwrap_or_else(|| state.config.default_model.clone());
    let extra = request.options.unwrap_or_default();
    let options = TokenizeOptions {
        return_tokens: request.return_tokens.unwrap_or(true),
        return_token_ids: request.return_token_ids.unwrap_or(true),
        add_special_tokens: extra.add_special_tokens.unwrap_or(false),
        include_decoded: extra.include_decoded.unwrap_or(false),
    };

    match tokenize_text(&state.tokenizers, &text, &model, options) {
        Ok(output) => {
            info!("Tokenized {} tokens with model {}", output.token_count, output.model);
            Ok((StatusCode::OK, Json(serde_json::to_value(output).map_err(anyhow::Error::from)?)))
        }
        Err(e) => {
            warn!("Tokenization failed for model {model}: {e}");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                    "model": model,
                    "text": text,
                })),
            ))
        }
    }
}

/// Any method other than GET or POST.
pub async fn handle_unsupported_method(method: Method) -> AppError {
    AppError::MethodNotAllowed(method.to_string())
}
