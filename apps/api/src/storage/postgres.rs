use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use crate::storage::{item_id, DocumentStore, ItemFilter, StorageError};

/// Document store backed by a single JSONB table (see `db::ensure_schema`).
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `ON CONFLICT DO NOTHING` reports a taken id as zero affected rows.
fn inserted_or_conflict(rows_affected: u64, container: &str, id: &str) -> Result<(), StorageError> {
    if rows_affected == 0 {
        return Err(StorageError::Conflict {
            container: container.to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create_item(&self, container: &str, item: &Value) -> Result<(), StorageError> {
        let id = item_id(item)?;

        let result = sqlx::query(
            r#"
            INSERT INTO items (container, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (container, id) DO NOTHING
            "#,
        )
        .bind(container)
        .bind(id)
        .bind(item)
        .execute(&self.pool)
        .await?;

        inserted_or_conflict(result.rows_affected(), container, id)?;

        debug!("Created item {id} in {container}");
        Ok(())
    }

    async fn read_item(&self, container: &str, id: &str) -> Result<Option<Value>, StorageError> {
        Ok(
            sqlx::query_scalar::<_, Value>("SELECT body FROM items WHERE container = $1 AND id = $2")
                .bind(container)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn query_items(
        &self,
        container: &str,
        filter: &ItemFilter,
    ) -> Result<Vec<Value>, StorageError> {
        let ItemFilter::FieldEquals { field, value } = filter;
        Ok(sqlx::query_scalar::<_, Value>(
            r#"
            SELECT body
            FROM items
            WHERE container = $1 AND body ->> $2 = $3
            ORDER BY created_at DESC
            "#,
        )
        .bind(container)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?)
    }
}
