//! Document pipeline: blob upload → LLM analysis (with fallback) → `DocumentRecord`.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::documents::prompts::{
    CONTENT_PREVIEW_CHARS, DOCUMENT_ANALYSIS_PROMPT_TEMPLATE, DOCUMENT_ANALYSIS_SYSTEM,
    DOCUMENT_OPTIONS,
};
use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{parse_json_reply, LlmClient};
use crate::models::document::DocumentRecord;
use crate::storage::{BlobStore, DocumentStore, DOCUMENTS_CONTAINER, DOCUMENT_BLOBS};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDocumentRequest {
    pub document_content: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
}

/// Validated input with defaults applied.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub content: String,
    pub file_name: String,
    pub file_type: String,
}

impl DocumentInput {
    pub fn from_request(request: ProcessDocumentRequest) -> Option<Self> {
        let content = request.document_content.filter(|c| !c.is_empty())?;
        let file_name = crate::request::non_blank(request.file_name)?;
        Some(Self {
            content,
            file_name,
            file_type: request.file_type.unwrap_or_else(|| "txt".to_string()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDocumentResponse {
    pub success: bool,
    pub document_id: String,
    pub analysis: Value,
    pub blob_url: String,
    pub word_count: usize,
}

pub fn blob_name(file_name: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}", at.format("%Y%m%d_%H%M%S"), file_name)
}

pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// First `max_chars` characters, never splitting a code point.
pub fn preview(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Analysis used when the model's reply is not JSON: the raw reply becomes the summary.
pub fn fallback_analysis(reply: &str) -> Value {
    json!({
        "summary": reply,
        "documentType": "unknown",
        "keyEntities": [],
        "isGrantRelated": false,
        "confidence": 0.5,
        "grantRequirements": [],
        "fundingAmount": null,
        "deadlines": []
    })
}

pub fn build_prompt(input: &DocumentInput) -> String {
    fill_template(
        DOCUMENT_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("file_name", input.file_name.as_str()),
            ("content", preview(&input.content, CONTENT_PREVIEW_CHARS)),
        ],
    )
}

pub async fn process_document(
    llm: &LlmClient,
    blobs: &dyn BlobStore,
    store: &dyn DocumentStore,
    input: DocumentInput,
) -> Result<ProcessDocumentResponse, AppError> {
    let name = blob_name(&input.file_name, Utc::now());

    if let Err(e) = blobs.ensure_container(DOCUMENT_BLOBS).await {
        // Container may already exist under another owner; the upload decides.
        warn!("Could not ensure blob container {DOCUMENT_BLOBS}: {e}");
    }
    let blob = blobs
        .upload(
            DOCUMENT_BLOBS,
            &name,
            Bytes::from(input.content.clone().into_bytes()),
            "text/plain; charset=utf-8",
        )
        .await?;

    let prompt = build_prompt(&input);
    let system = format!("{DOCUMENT_ANALYSIS_SYSTEM}\n{JSON_ONLY_INSTRUCTION}");
    let reply = llm
        .call_text(&system, &prompt, DOCUMENT_OPTIONS)
        .await
        .map_err(|e| AppError::Llm(format!("Document analysis failed: {e}")))?;

    let analysis = parse_json_reply::<Value>(&reply).unwrap_or_else(|e| {
        warn!("Document analysis was not JSON, using fallback: {e}");
        fallback_analysis(&reply)
    });

    let record = DocumentRecord {
        id: name,
        file_name: input.file_name,
        file_type: input.file_type,
        blob_url: blob.url,
        analysis,
        uploaded_at: Utc::now().to_rfc3339(),
        word_count: word_count(&input.content),
    };

    let item = serde_json::to_value(&record)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize document: {e}")))?;
    store.create_item(DOCUMENTS_CONTAINER, &item).await?;

    info!("Document processed successfully: {}", record.file_name);

    Ok(ProcessDocumentResponse {
        success: true,
        document_id: record.id,
        analysis: record.analysis,
        blob_url: record.blob_url,
        word_count: record.word_count,
    })
}
