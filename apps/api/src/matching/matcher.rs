//! Match pipeline: profile text → LLM ranking (or fallback) → enrichment.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, value_text, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{parse_json_reply, LlmClient};
use crate::matching::prompts::{
    GRANT_MATCHING_PROMPT_TEMPLATE, GRANT_MATCHING_SYSTEM, GRANT_SEPARATOR, MATCH_OPTIONS,
    MAX_GRANTS_IN_PROMPT,
};
use crate::models::grant::STATUS_ACTIVE;
use crate::storage::{DocumentStore, ItemFilter, DOCUMENTS_CONTAINER, GRANTS_CONTAINER};

/// Grants scored by the fallback when the LLM reply is unusable.
const FALLBACK_GRANTS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchQuery {
    pub document_id: Option<String>,
    pub organization_type: Option<String>,
    pub research_area: Option<String>,
}

/// Who the grants are matched against.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchSubject {
    Document(String),
    Organization {
        organization_type: String,
        research_area: Option<String>,
    },
}

impl MatchSubject {
    /// A document id takes precedence over an organization profile.
    pub fn from_query(query: MatchQuery) -> Option<Self> {
        let research_area = crate::request::non_blank(query.research_area);
        match (
            crate::request::non_blank(query.document_id),
            crate::request::non_blank(query.organization_type),
        ) {
            (Some(id), _) => Some(MatchSubject::Document(id)),
            (None, Some(organization_type)) => Some(MatchSubject::Organization {
                organization_type,
                research_area,
            }),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocumentSummary {
    pub id: Value,
    pub file_name: Value,
    pub analysis: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub success: bool,
    pub matches: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_grants: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_document: Option<Option<UserDocumentSummary>>,
}

fn field_text(item: &Value, key: &str, default: &str) -> String {
    item.get(key)
        .filter(|v| !v.is_null())
        .map(value_text)
        .unwrap_or_else(|| default.to_string())
}

/// Profile text for a stored document's analysis.
pub fn document_profile(document: &Value) -> String {
    let analysis = document.get("analysis").cloned().unwrap_or_else(|| json!({}));
    let summary = analysis
        .get("summary")
        .filter(|v| !v.is_null())
        .map(value_text)
        .unwrap_or_else(|| "No summary available".to_string());
    format!(
        "Document Analysis: {}\nDocument Type: {}\nDocument Summary: {}",
        analysis,
        field_text(document, "fileType", "unknown"),
        summary
    )
}

pub fn organization_profile(organization_type: &str, research_area: Option<&str>) -> String {
    format!(
        "Organization Type: {}\nResearch Area: {}",
        organization_type,
        research_area.unwrap_or("Not specified")
    )
}

pub fn build_prompt(user_profile: &str, grants: &[Value]) -> String {
    fill_template(
        GRANT_MATCHING_PROMPT_TEMPLATE,
        &[("user_profile", user_profile), ("grants", describe_grants(grants).as_str())],
    )
}

/// Describes the first `MAX_GRANTS_IN_PROMPT` grants for the prompt.
pub fn describe_grants(grants: &[Value]) -> String {
    grants
        .iter()
        .take(MAX_GRANTS_IN_PROMPT)
        .map(|grant| {
            let requirements = grant
                .get("analysis")
                .and_then(|a| a.get("eligibilityRequirements"))
                .cloned()
                .unwrap_or_else(|| json!([]));
            format!(
                "Grant ID: {}\nDescription: {}\nFunding Amount: {}\nDeadline: {}\nOrganization Type: {}\nRequirements: {}",
                field_text(grant, "id", ""),
                field_text(grant, "originalDescription", "No description"),
                field_text(grant, "fundingAmount", "Not specified"),
                field_text(grant, "deadline", "Not specified"),
                field_text(grant, "organizationType", "Not specified"),
                requirements
            )
        })
        .collect::<Vec<_>>()
        .join(GRANT_SEPARATOR)
}

/// Accepts a bare array or an object wrapping a `matches` array.
pub fn parse_matches(reply: &str) -> Option<Vec<Value>> {
    match parse_json_reply::<Value>(reply).ok()? {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => match obj.remove("matches") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Descending scores for the first few grants, floored at 20.
pub fn fallback_matches(grants: &[Value]) -> Vec<Value> {
    grants
        .iter()
        .take(FALLBACK_GRANTS)
        .enumerate()
        .map(|(i, grant)| {
            json!({
                "grantId": grant.get("id").cloned().unwrap_or(Value::Null),
                "matchScore": (80 - 15 * i as i64).max(20),
                "reasoning": "Basic compatibility analysis",
                "strengths": ["Organization type alignment"],
                "gaps": ["Detailed analysis needed"],
                "recommendations": ["Review grant requirements thoroughly"],
                "priority": "medium"
            })
        })
        .collect()
}

/// Drops matches for unknown grants, attaches grant details, sorts by score.
pub fn enrich_matches(matches: Vec<Value>, grants: &[Value]) -> Vec<Value> {
    let mut enriched: Vec<Value> = matches
        .into_iter()
        .filter_map(|m| {
            let Value::Object(mut fields) = m else {
                return None;
            };
            let grant_id = fields.get("grantId").and_then(Value::as_str)?;
            let grant = grants
                .iter()
                .find(|g| g.get("id").and_then(Value::as_str) == Some(grant_id))?;

            let mut details = Map::new();
            for (out, key) in [
                ("description", "originalDescription"),
                ("fundingAmount", "fundingAmount"),
                ("deadline", "deadline"),
                ("organizationType", "organizationType"),
                ("analyzedAt", "analyzedAt"),
            ] {
                details.insert(
                    out.to_string(),
                    grant.get(key).cloned().unwrap_or_else(|| json!("")),
                );
            }
            fields.insert("grantDetails".to_string(), Value::Object(details));
            Some(Value::Object(fields))
        })
        .collect();

    // Stable: equal scores keep the model's order.
    enriched.sort_by(|a, b| score(b).total_cmp(&score(a)));
    enriched
}

fn score(m: &Value) -> f64 {
    m.get("matchScore").and_then(Value::as_f64).unwrap_or(0.0)
}

pub async fn find_matches(
    llm: &LlmClient,
    store: &dyn DocumentStore,
    subject: MatchSubject,
) -> Result<MatchResponse, AppError> {
    let (user_profile, user_document) = match &subject {
        MatchSubject::Document(id) => match store.read_item(DOCUMENTS_CONTAINER, id).await {
            Ok(Some(doc)) => (document_profile(&doc), Some(doc)),
            Ok(None) => {
                warn!("Document not found: {id}");
                return Err(AppError::NotFound("Document not found".to_string()));
            }
            Err(e) => {
                warn!("Document not found: {id} ({e})");
                return Err(AppError::NotFound("Document not found".to_string()));
            }
        },
        MatchSubject::Organization {
            organization_type,
            research_area,
        } => (
            organization_profile(organization_type, research_area.as_deref()),
            None,
        ),
    };

    let grants = store
        .query_items(
            GRANTS_CONTAINER,
            &ItemFilter::field_equals("status", STATUS_ACTIVE),
        )
        .await
        .unwrap_or_else(|e| {
            error!("Error querying grants: {e}");
            Vec::new()
        });

    if grants.is_empty() {
        return Ok(MatchResponse {
            success: true,
            matches: Vec::new(),
            message: Some("No active grants found".to_string()),
            total_grants: None,
            user_document: None,
        });
    }

    let prompt = build_prompt(&user_profile, &grants);
    let system = format!("{GRANT_MATCHING_SYSTEM}\n{JSON_ONLY_INSTRUCTION}");
    let reply = llm
        .call_text(&system, &prompt, MATCH_OPTIONS)
        .await
        .map_err(|e| AppError::Llm(format!("Grant matching failed: {e}")))?;

    let matches = parse_matches(&reply).unwrap_or_else(|| {
        warn!("Match reply was not a JSON array, using fallback scoring");
        fallback_matches(&grants)
    });
    let matches = enrich_matches(matches, &grants);

    info!("Found {} grant matches", matches.len());

    let user_document = user_document.map(|doc| UserDocumentSummary {
        id: doc.get("id").cloned().unwrap_or(Value::Null),
        file_name: doc.get("fileName").cloned().unwrap_or(Value::Null),
        analysis: doc.get("analysis").cloned().unwrap_or(Value::Null),
    });

    Ok(MatchResponse {
        success: true,
        matches,
        message: None,
        total_grants: Some(grants.len()),
        user_document: Some(user_document),
    })
}
