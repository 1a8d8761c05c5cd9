mod api;

use anyhow::Context;
use clap::Parser;
use rulebook_qa_core::{
    BackendConfig, ChunkingOptions, GeminiClient, MiniLmEmbedder, QdrantStore, RulebookService,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rulebook-qa-server", version)]
struct Cli {
    /// Address to bind the HTTP server on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    bind: String,

    /// Directory where uploaded rulebooks are kept for the session's lifetime.
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    upload_dir: String,

    /// Number of chunks retrieved per question.
    #[arg(long, default_value = "5")]
    top_k: usize,

    /// Chunk size in characters.
    #[arg(long, default_value = "500")]
    chunk_size: usize,

    /// Chunk overlap in characters.
    #[arg(long, default_value = "100")]
    chunk_overlap: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = BackendConfig::from_env().context("backend configuration")?;

    let embedder = MiniLmEmbedder::new()
        .map_err(|error| anyhow::anyhow!("embedding model: {error}"))?;
    let index = QdrantStore::new(&config.qdrant_url, Some(config.qdrant_api_key.clone()))?;
    let model = GeminiClient::new(&config.gemini_api_key)?;

    tokio::fs::create_dir_all(&cli.upload_dir)
        .await
        .with_context(|| format!("creating upload dir {}", cli.upload_dir))?;

    let chunking = ChunkingOptions {
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.chunk_overlap,
    };
    let service = RulebookService::new(
        Arc::new(embedder),
        Arc::new(index),
        Arc::new(model),
        &cli.upload_dir,
    )
    .with_options(chunking, cli.top_k);

    let router = api::router(Arc::new(service));
    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;

    info!(addr = %cli.bind, upload_dir = %cli.upload_dir, "rulebook-qa-server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
