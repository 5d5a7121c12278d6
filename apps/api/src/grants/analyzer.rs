//! Grant analysis pipeline: prompt → LLM JSON → persisted `GrantRecord`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::grants::prompts::{ANALYZE_OPTIONS, GRANT_ANALYSIS_PROMPT_TEMPLATE, GRANT_ANALYSIS_SYSTEM};
use crate::llm_client::prompts::{fill_template, value_text, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{parse_json_reply, LlmClient};
use crate::models::grant::{GrantRecord, STATUS_ACTIVE};
use crate::storage::{DocumentStore, GRANTS_CONTAINER};

const NOT_SPECIFIED: &str = "Not specified";

/// Request body for grant analysis.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeGrantRequest {
    pub grant_description: Option<String>,
    pub organization_type: Option<Value>,
    pub funding_amount: Option<Value>,
    pub deadline: Option<Value>,
}

/// Validated analysis input with defaults applied.
#[derive(Debug, Clone)]
pub struct GrantInput {
    pub description: String,
    pub organization_type: Value,
    pub funding_amount: Value,
    pub deadline: Value,
}

impl GrantInput {
    /// Applies defaults; `None` when the description is missing or blank.
    pub fn from_request(request: AnalyzeGrantRequest) -> Option<Self> {
        let description = crate::request::non_blank(request.grant_description)?;
        Some(Self {
            description,
            organization_type: or_not_specified(request.organization_type),
            funding_amount: or_not_specified(request.funding_amount),
            deadline: or_not_specified(request.deadline),
        })
    }
}

fn or_not_specified(value: Option<Value>) -> Value {
    value
        .filter(|v| !v.is_null())
        .unwrap_or_else(|| Value::String(NOT_SPECIFIED.to_string()))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeGrantResponse {
    pub success: bool,
    pub grant_id: String,
    pub analysis: Value,
}

/// Deterministic per description and second: `grant_<YYYYMMDD_HHMMSS>_<md5 prefix>`.
pub fn grant_id(description: &str, at: DateTime<Utc>) -> String {
    let digest = format!("{:x}", md5::compute(description.as_bytes()));
    format!("grant_{}_{}", at.format("%Y%m%d_%H%M%S"), &digest[..8])
}

pub fn build_prompt(input: &GrantInput) -> String {
    fill_template(
        GRANT_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("grant_description", input.description.as_str()),
            ("organization_type", value_text(&input.organization_type).as_str()),
            ("funding_amount", value_text(&input.funding_amount).as_str()),
            ("deadline", value_text(&input.deadline).as_str()),
        ],
    )
}

/// Runs the analysis and persists the grant as active.
pub async fn analyze_grant(
    llm: &LlmClient,
    store: &dyn DocumentStore,
    input: GrantInput,
) -> Result<AnalyzeGrantResponse, AppError> {
    let system = format!("{GRANT_ANALYSIS_SYSTEM}\n{JSON_ONLY_INSTRUCTION}");
    let reply = llm
        .call_text(&system, &build_prompt(&input), ANALYZE_OPTIONS)
        .await
        .map_err(|e| AppError::Llm(format!("Grant analysis failed: {e}")))?;

    let analysis: Value = parse_json_reply(&reply).map_err(|e| {
        warn!("Unparseable grant analysis: {e}");
        AppError::Llm("Failed to parse grant analysis from OpenAI".to_string())
    })?;

    let now = Utc::now();
    let record = GrantRecord {
        id: grant_id(&input.description, now),
        original_description: input.description,
        organization_type: input.organization_type,
        funding_amount: input.funding_amount,
        deadline: input.deadline,
        analysis,
        analyzed_at: now.to_rfc3339(),
        status: STATUS_ACTIVE.to_string(),
    };

    let item = serde_json::to_value(&record)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize grant: {e}")))?;
    store.create_item(GRANTS_CONTAINER, &item).await?;

    info!("Grant analyzed successfully: {}", record.id);

    Ok(AnalyzeGrantResponse {
        success: true,
        grant_id: record.id,
        analysis: record.analysis,
    })
}
