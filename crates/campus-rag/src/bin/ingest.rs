//! Directory ingestion tool
//!
//! Run with: cargo run -p campus-rag --bin campus-rag-ingest -- <directory>

use std::path::PathBuf;

use campus_rag::{RagConfig, RagEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("Usage: campus-rag-ingest <directory>"))?;

    let config = RagConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding backend: {:?}", config.embedding.backend);
    tracing::info!("  - Chunk size / overlap: {} / {}", config.chunking.chunk_size, config.chunking.chunk_overlap);
    tracing::info!("  - Collection: {}", config.vector_db.collection);
    tracing::info!("  - Store: {}", config.vector_db.storage_path.display());

    let engine = RagEngine::new(config)?;
    let report = engine.ingest_directory(&dir).await?;

    println!(
        "Ingested {} files into {} chunks",
        report.files, report.chunks
    );

    Ok(())
}
