use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Processed user document persisted in the `Documents` container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Same as the blob name.
    pub id: String,
    pub file_name: String,
    pub file_type: String,
    pub blob_url: String,
    pub analysis: Value,
    pub uploaded_at: String,
    pub word_count: usize,
}
