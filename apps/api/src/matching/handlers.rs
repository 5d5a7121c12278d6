//! Axum route handlers for the grant matching API.

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::matching::matcher::{find_matches, MatchQuery, MatchResponse, MatchSubject};
use crate::state::AppState;

/// GET /api/getmatches?documentId=..|organizationType=..&researchArea=..
pub async fn handle_get_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<MatchResponse>, AppError> {
    info!("GetMatches triggered");

    let subject = MatchSubject::from_query(query).ok_or_else(|| {
        AppError::Validation("Either documentId or organizationType is required".to_string())
    })?;

    let llm = state.llm()?;
    let store = state.documents()?;

    Ok(Json(find_matches(llm, store, subject).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use wiremock::MockServer;

    use crate::llm_client::test_support::{mount_reply, test_client};
    use crate::routes::test_support::get;
    use crate::state::test_support::{bare_state, memory_state};
    use crate::state::AppState;
    use crate::storage::memory::{MemoryBlobStore, MemoryDocumentStore};
    use crate::storage::{DocumentStore, DOCUMENTS_CONTAINER, GRANTS_CONTAINER};

    async fn seeded_store() -> Arc<MemoryDocumentStore> {
        let store = Arc::new(MemoryDocumentStore::default());
        for (id, status) in [("grant_a", "active"), ("grant_b", "active"), ("grant_old", "closed")] {
            store
                .create_item(
                    GRANTS_CONTAINER,
                    &json!({
                        "id": id,
                        "originalDescription": format!("{id} description"),
                        "fundingAmount": 20000,
                        "deadline": "2025-03-01",
                        "organizationType": "Nonprofit",
                        "analyzedAt": "2024-06-01T00:00:00Z",
                        "analysis": {"eligibilityRequirements": []},
                        "status": status
                    }),
                )
                .await
                .unwrap();
        }
        store
            .create_item(
                DOCUMENTS_CONTAINER,
                &json!({
                    "id": "20240601_120000_profile.txt",
                    "fileName": "profile.txt",
                    "fileType": "txt",
                    "analysis": {"summary": "Literacy nonprofit"}
                }),
            )
            .await
            .unwrap();
        store
    }

    async fn state_with(server: &MockServer, store: Arc<MemoryDocumentStore>) -> AppState {
        memory_state(Some(test_client(server)), store, Arc::new(MemoryBlobStore::default()))
    }

    #[tokio::test]
    async fn test_requires_document_or_organization() {
        let (status, body) = get(bare_state(), "/api/getmatches?researchArea=health").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Either documentId or organizationType is required");
    }

    #[tokio::test]
    async fn test_unknown_document_is_404() {
        let server = MockServer::start().await;
        let state = state_with(&server, seeded_store().await).await;
        let (status, body) = get(state, "/api/getmatches?documentId=missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Document not found");
    }

    #[tokio::test]
    async fn test_document_read_failure_is_404() {
        let server = MockServer::start().await;
        let state = state_with(&server, Arc::new(MemoryDocumentStore::failing_reads())).await;
        let (status, body) = get(state, "/api/getmatches?documentId=doc1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Document not found");
    }

    #[tokio::test]
    async fn test_no_active_grants_short_circuits() {
        let server = MockServer::start().await;
        let state = state_with(&server, Arc::new(MemoryDocumentStore::default())).await;
        let (status, body) = get(state, "/api/getmatches?organizationType=University").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matches"], json!([]));
        assert_eq!(body["message"], "No active grants found");
    }

    #[tokio::test]
    async fn test_grant_query_failure_treated_as_no_grants() {
        let server = MockServer::start().await;
        let state = state_with(&server, Arc::new(MemoryDocumentStore::failing_queries())).await;
        let (status, body) = get(state, "/api/getmatches?organizationType=University").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "No active grants found");
    }

    #[tokio::test]
    async fn test_llm_matches_are_enriched_and_sorted() {
        let server = MockServer::start().await;
        mount_reply(
            &server,
            r#"[
                {"grantId": "grant_a", "matchScore": 55, "priority": "medium"},
                {"grantId": "grant_b", "matchScore": 91, "priority": "high"},
                {"grantId": "grant_old", "matchScore": 99, "priority": "high"}
            ]"#,
        )
        .await;
        let state = state_with(&server, seeded_store().await).await;

        let (status, body) =
            get(state, "/api/getmatches?documentId=20240601_120000_profile.txt").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalGrants"], 2);
        let matches = body["matches"].as_array().unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m["grantId"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["grant_b", "grant_a"]);
        assert_eq!(matches[0]["grantDetails"]["fundingAmount"], 20000);
        assert_eq!(body["userDocument"]["fileName"], "profile.txt");
        assert_eq!(body["userDocument"]["analysis"]["summary"], "Literacy nonprofit");
    }

    #[tokio::test]
    async fn test_unparseable_reply_uses_fallback_scores() {
        let server = MockServer::start().await;
        mount_reply(&server, "Both grants look like a decent fit.").await;
        let state = state_with(&server, seeded_store().await).await;

        let (status, body) = get(state, "/api/getmatches?organizationType=Nonprofit").await;

        assert_eq!(status, StatusCode::OK);
        let scores: Vec<i64> = body["matches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["matchScore"].as_i64().unwrap())
            .collect();
        assert_eq!(scores, vec![80, 65]);
        assert_eq!(body["userDocument"], Value::Null);
    }
}
