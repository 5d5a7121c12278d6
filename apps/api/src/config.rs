use anyhow::{Context, Result};

/// Credentials for the hosted chat-completion deployment.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

/// Connection settings for the S3-compatible blob store.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
///
/// External services are optional at startup: each endpoint checks for the
/// services it needs and reports a missing one as a server error.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: Option<LlmConfig>,
    pub database_url: Option<String>,
    pub blob: Option<BlobConfig>,
    pub default_model: String,
    pub max_body_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm = match (
            optional_env("AZURE_OPENAI_ENDPOINT"),
            optional_env("AZURE_OPENAI_KEY"),
        ) {
            (Some(endpoint), Some(api_key)) => Some(LlmConfig {
                endpoint,
                api_key,
                deployment: optional_env("AZURE_OPENAI_DEPLOYMENT_NAME")
                    .unwrap_or_else(|| "gpt-35-turbo".to_string()),
                api_version: optional_env("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| "2024-02-01".to_string()),
            }),
            _ => None,
        };

        let blob = match (
            optional_env("S3_BUCKET"),
            optional_env("S3_ENDPOINT"),
            optional_env("AWS_ACCESS_KEY_ID"),
            optional_env("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(bucket), Some(endpoint), Some(access_key_id), Some(secret_access_key)) => {
                Some(BlobConfig {
                    bucket,
                    endpoint,
                    region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                    access_key_id,
                    secret_access_key,
                })
            }
            _ => None,
        };

        Ok(Config {
            llm,
            database_url: optional_env("DATABASE_URL"),
            blob,
            default_model: optional_env("DEFAULT_MODEL").unwrap_or_else(|| "simple".to_string()),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .unwrap_or_else(|_| (50 * 1024 * 1024).to_string())
                .parse::<usize>()
                .context("MAX_BODY_BYTES must be a byte count")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Treats unset and blank variables the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
