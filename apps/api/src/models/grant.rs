use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Grant opportunity persisted in the `GrantOpportunities` container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRecord {
    pub id: String,
    pub original_description: String,
    pub organization_type: Value,
    pub funding_amount: Value,
    pub deadline: Value,
    /// LLM analysis, stored verbatim.
    pub analysis: Value,
    pub analyzed_at: String,
    /// "active" grants are eligible for matching.
    pub status: String,
}

pub const STATUS_ACTIVE: &str = "active";
