//! In-process stores used by handler tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::storage::{item_id, BlobRef, BlobStore, DocumentStore, ItemFilter, StorageError};

#[derive(Default)]
pub struct MemoryDocumentStore {
    // (container, id, body) in insertion order
    items: Mutex<Vec<(String, String, Value)>>,
    fail_queries: bool,
    fail_reads: bool,
}

impl MemoryDocumentStore {
    /// A store whose `query_items` always errors.
    pub fn failing_queries() -> Self {
        Self {
            fail_queries: true,
            ..Self::default()
        }
    }

    /// A store whose `read_item` always errors.
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn items_in(&self, container: &str) -> Vec<Value> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _, _)| c == container)
            .map(|(_, _, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_item(&self, container: &str, item: &Value) -> Result<(), StorageError> {
        let id = item_id(item)?.to_string();
        let mut items = self.items.lock().unwrap();
        if items.iter().any(|(c, i, _)| c == container && *i == id) {
            return Err(StorageError::Conflict {
                container: container.to_string(),
                id,
            });
        }
        items.push((container.to_string(), id, item.clone()));
        Ok(())
    }

    async fn read_item(&self, container: &str, id: &str) -> Result<Option<Value>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|(c, i, _)| c == container && i == id)
            .map(|(_, _, body)| body.clone()))
    }

    async fn query_items(
        &self,
        container: &str,
        filter: &ItemFilter,
    ) -> Result<Vec<Value>, StorageError> {
        if self.fail_queries {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|(c, _, body)| c == container && filter.matches(body))
            .map(|(_, _, body)| body.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Bytes, String)>>,
}

impl MemoryBlobStore {
    pub fn get(&self, container: &str, name: &str) -> Option<(Bytes, String)> {
        self.blobs
            .lock()
            .unwrap()
            .get(&format!("{container}/{name}"))
            .cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn ensure_container(&self, _container: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn upload(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<BlobRef, StorageError> {
        let key = format!("{container}/{name}");
        self.blobs
            .lock()
            .unwrap()
            .insert(key.clone(), (data, content_type.to_string()));
        Ok(BlobRef {
            url: format!("memory://{key}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_create_then_read() {
        let store = MemoryDocumentStore::default();
        store
            .create_item("Documents", &json!({"id": "d1", "fileName": "a.txt"}))
            .await
            .unwrap();
        let item = store.read_item("Documents", "d1").await.unwrap().unwrap();
        assert_eq!(item["fileName"], "a.txt");
        assert!(store.read_item("GrantOpportunities", "d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let store = MemoryDocumentStore::default();
        store.create_item("Documents", &json!({"id": "d1"})).await.unwrap();
        let err = store
            .create_item("Documents", &json!({"id": "d1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_query_returns_newest_first() {
        let store = MemoryDocumentStore::default();
        for (id, status) in [("g1", "active"), ("g2", "closed"), ("g3", "active")] {
            store
                .create_item("GrantOpportunities", &json!({"id": id, "status": status}))
                .await
                .unwrap();
        }
        let active = store
            .query_items("GrantOpportunities", &ItemFilter::field_equals("status", "active"))
            .await
            .unwrap();
        let ids: Vec<_> = active.iter().map(|g| g["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["g3", "g1"]);
    }
}
