use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::storage::{BlobStore, DocumentStore};
use crate::tokenizer::TokenizerCache;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when the LLM endpoint is not configured.
    pub llm: Option<LlmClient>,
    pub documents: Option<Arc<dyn DocumentStore>>,
    pub blobs: Option<Arc<dyn BlobStore>>,
    /// Process-wide tokenizer cache, shared across requests.
    pub tokenizers: Arc<TokenizerCache>,
    pub config: Config,
}

impl AppState {
    pub fn llm(&self) -> Result<&LlmClient, AppError> {
        self.llm.as_ref().ok_or_else(|| {
            AppError::Configuration("Azure OpenAI configuration missing".to_string())
        })
    }

    pub fn documents(&self) -> Result<&dyn DocumentStore, AppError> {
        self.documents
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Cosmos DB configuration missing".to_string()))
    }

    pub fn blobs(&self) -> Result<&dyn BlobStore, AppError> {
        self.blobs.as_deref().ok_or_else(|| {
            AppError::Configuration("Storage connection string missing".to_string())
        })
    }
}
