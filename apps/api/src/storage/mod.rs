//! Storage clients: a JSON document store and a blob store.
//!
//! Handlers only see the traits; `AppState` carries `Arc<dyn ...>` so the
//! backends can be swapped without touching endpoint code.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub mod postgres;
pub mod s3;

#[cfg(test)]
pub mod memory;

/// Document container holding analyzed grant opportunities.
pub const GRANTS_CONTAINER: &str = "GrantOpportunities";
/// Document container holding processed user documents.
pub const DOCUMENTS_CONTAINER: &str = "Documents";
/// Blob container for raw uploaded documents.
pub const DOCUMENT_BLOBS: &str = "documents";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Item '{id}' already exists in container '{container}'")]
    Conflict { container: String, id: String },

    #[error("Item must be a JSON object with a string 'id' field")]
    MissingId,

    #[error("Blob store error: {0}")]
    Blob(String),
}

/// Selection predicate for `DocumentStore::query_items`.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemFilter {
    /// Top-level string field equals the given value.
    FieldEquals { field: String, value: String },
}

impl ItemFilter {
    pub fn field_equals(field: &str, value: &str) -> Self {
        ItemFilter::FieldEquals {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn matches(&self, item: &Value) -> bool {
        match self {
            ItemFilter::FieldEquals { field, value } => {
                item.get(field).and_then(Value::as_str) == Some(value.as_str())
            }
        }
    }
}

/// Flat JSON records persisted verbatim, addressed by container and `id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new item. Fails with `Conflict` if the id is taken.
    async fn create_item(&self, container: &str, item: &Value) -> Result<(), StorageError>;

    async fn read_item(&self, container: &str, id: &str) -> Result<Option<Value>, StorageError>;

    /// Returns matching items, newest first.
    async fn query_items(
        &self,
        container: &str,
        filter: &ItemFilter,
    ) -> Result<Vec<Value>, StorageError>;
}

/// Location of an uploaded blob.
#[derive(Debug, Clone, Serialize)]
pub struct BlobRef {
    pub url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Creates the container if it does not exist yet.
    async fn ensure_container(&self, container: &str) -> Result<(), StorageError>;

    /// Uploads `data`, overwriting any blob with the same name.
    async fn upload(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<BlobRef, StorageError>;
}

/// Extracts the mandatory string id of an item.
pub(crate) fn item_id(item: &Value) -> Result<&str, StorageError> {
    item.get("id")
        .and_then(Value::as_str)
        .ok_or(StorageError::MissingId)
}
