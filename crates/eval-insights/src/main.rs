mod analyzer;
mod anomaly;
mod chunker;
mod config;
mod error;
mod format;
mod http;
mod index;
mod member;
mod model;
mod promotion;
mod reply;
mod report;
mod server;
#[cfg(test)]
mod test_support;
mod violation;

use std::sync::Arc;

use eval_common::capability::{EmbeddingProvider, TextGenerator};
use eval_common::embedding::Embedder;
use eval_common::openai::{ChatModel, OpenAiClient, OpenAiClientConfig, OpenAiEmbedder};
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use analyzer::ViolationAnalyzer;
use config::{Config, EmbeddingBackend};
use server::EvalInsightsServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is reserved for MCP JSON-RPC in stdio mode.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting eval-insights");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        chat_model = %config.chat_model,
        embedding_backend = ?config.embedding_backend,
        chunk_size = config.chunking.chunk_size(),
        chunk_overlap = config.chunking.overlap(),
        group_concurrency = config.group_concurrency,
        "configuration loaded"
    );

    let openai_config = OpenAiClientConfig::from_env();
    info!(
        base_url = %openai_config.base_url,
        timeout_ms = openai_config.default_timeout.as_millis(),
        max_retries = openai_config.max_retries,
        "openai client configured"
    );
    let openai = Arc::new(OpenAiClient::new(openai_config)?);

    // 2. Generation and embedding capabilities
    let generator: Arc<dyn TextGenerator> = Arc::new(ChatModel::new(
        Arc::clone(&openai),
        config.chat_model.clone(),
        Some(config.chat_temperature),
    ));
    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
        EmbeddingBackend::Local => {
            info!("initializing embedding model (may download on first run)");
            let embedder = Embedder::new().await?;
            info!("embedding model ready");
            Arc::new(embedder)
        }
        EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbedder::new(
            Arc::clone(&openai),
            config.openai_embedding_model.clone(),
        )),
    };

    let analyzer = ViolationAnalyzer::new(
        Arc::clone(&generator),
        embedder,
        config.chunking,
        config.group_concurrency,
    );

    // 3. Serve MCP on stdio, or HTTP
    if config.mcp_stdio {
        let server = EvalInsightsServer::new(generator, analyzer);
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
        return Ok(());
    }

    let app = http::router(http::AppState {
        generator,
        analyzer,
    });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
