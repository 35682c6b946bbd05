use std::str::FromStr;

use crate::chunker::ChunkConfig;
use crate::error::AppError;

/// Where segment and query embeddings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// In-process fastembed model.
    Local,
    /// The `/embeddings` endpoint of the configured OpenAI-compatible host.
    OpenAi,
}

/// Application configuration loaded explicitly from environment variables.
///
/// Every field has a default. Values that are present but invalid are reported as
/// `AppError::Config` instead of being silently replaced. The OpenAI transport settings
/// (`OPENAI_BASE_URL`, `OPENAI_API_KEY`, retry policy) are read separately by
/// `OpenAiClientConfig::from_env`.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address (`HTTP_LISTEN_ADDR`, default "127.0.0.1:8000").
    pub listen_addr: String,
    /// Serve the MCP tools on stdio instead of HTTP (`MCP_STDIO`).
    pub mcp_stdio: bool,
    /// Generation model id (`CHAT_MODEL`, default "gpt-4o").
    pub chat_model: String,
    /// Generation temperature (`CHAT_TEMPERATURE`, default 0.1).
    pub chat_temperature: f32,
    /// Embedding backend (`EMBEDDING_BACKEND`, "local" or "openai", default "local").
    pub embedding_backend: EmbeddingBackend,
    /// Remote embedding model (`OPENAI_EMBEDDING_MODEL`), used by the openai backend.
    pub openai_embedding_model: String,
    /// Guideline chunking (`GUIDE_CHUNK_SIZE` / `GUIDE_CHUNK_OVERLAP`, default 400 / 50).
    pub chunking: ChunkConfig,
    /// Upper bound on evaluation groups analysed at once (`VIOLATION_GROUP_CONCURRENCY`).
    pub group_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let embedding_backend = match var("EMBEDDING_BACKEND").as_deref() {
            None | Some("local") => EmbeddingBackend::Local,
            Some("openai") => EmbeddingBackend::OpenAi,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "EMBEDDING_BACKEND must be 'local' or 'openai', got '{other}'"
                )))
            }
        };

        let mcp_stdio = matches!(var("MCP_STDIO").as_deref(), Some("1" | "true" | "yes"));

        let chunk_size = parse_or(&var, "GUIDE_CHUNK_SIZE", ChunkConfig::DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = parse_or(&var, "GUIDE_CHUNK_OVERLAP", ChunkConfig::DEFAULT_OVERLAP)?;
        let chunking = ChunkConfig::new(chunk_size, chunk_overlap)?;

        let group_concurrency: usize = parse_or(&var, "VIOLATION_GROUP_CONCURRENCY", 4)?;
        if group_concurrency == 0 {
            return Err(AppError::Config(
                "VIOLATION_GROUP_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            listen_addr: var("HTTP_LISTEN_ADDR").unwrap_or_else(|| "127.0.0.1:8000".to_string()),
            mcp_stdio,
            chat_model: var("CHAT_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            chat_temperature: parse_or(&var, "CHAT_TEMPERATURE", 0.1)?,
            embedding_backend,
            openai_embedding_model: var("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            chunking,
            group_concurrency,
        })
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: '{raw}'"))),
    }
}
