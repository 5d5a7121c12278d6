mod config;
mod db;
mod documents;
mod errors;
mod forms;
mod grants;
mod llm_client;
mod matching;
mod models;
mod request;
mod routes;
mod state;
mod storage;
mod tokenizer;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::postgres::PgDocumentStore;
use crate::storage::s3::S3BlobStore;
use crate::storage::{BlobStore, DocumentStore};
use crate::tokenizer::TokenizerCache;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Grant Assistant API v{}", env!("CARGO_PKG_VERSION"));

    let llm = match config.llm.clone() {
        Some(llm_config) => {
            let client = LlmClient::new(llm_config)?;
            info!("LLM client initialized (deployment: {})", client.deployment());
            Some(client)
        }
        None => {
            warn!("Azure OpenAI not configured; LLM-backed endpoints will fail");
            None
        }
    };

    let documents: Option<Arc<dyn DocumentStore>> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            ensure_schema(&pool).await?;
            Some(Arc::new(PgDocumentStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set; document storage disabled");
            None
        }
    };

    let blobs: Option<Arc<dyn BlobStore>> = match &config.blob {
        Some(blob_config) => {
            let store = S3BlobStore::connect(blob_config).await;
            info!("S3 client initialized (bucket: {})", blob_config.bucket);
            Some(Arc::new(store))
        }
        None => {
            warn!("S3 storage not configured; document uploads disabled");
            None
        }
    };

    let state = AppState {
        llm,
        documents,
        blobs,
        tokenizers: Arc::new(TokenizerCache::default()),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
