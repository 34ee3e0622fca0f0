//! The question-answering engine
//!
//! `RagEngine` owns the whole pipeline: loading, chunking, embedding,
//! storage, retrieval, and generation. Components are expensive to build
//! (HTTP clients, database), so they are constructed lazily on first use
//! and at most once, even under concurrent first calls.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::{Error, Result};
use crate::generation::{dedup_citations, ChatClient, PromptAssembler};
use crate::ingestion::{DocumentLoader, TextSplitter};
use crate::providers::{
    EmbeddingProvider, GenerationClient, HashEmbedder, HostedEmbedder, OllamaEmbedder,
};
use crate::retrieval::Retriever;
use crate::storage::VectorStore;
use crate::types::{ConversationMessage, IngestReport, RagAnswer, ScoredChunk};

/// Fully wired pipeline components
struct Components {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationClient>,
    store: VectorStore,
    retriever: Retriever,
    splitter: TextSplitter,
}

/// Retrieval-augmented question answering engine
pub struct RagEngine {
    config: RagConfig,
    components: OnceCell<Arc<Components>>,
    init_attempts: AtomicUsize,
}

impl RagEngine {
    /// Create an engine from a validated configuration
    ///
    /// Components are not built yet; the first operation triggers the
    /// one-time construction, which fails with `Error::Config` when the
    /// generation API key is missing.
    pub fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            components: OnceCell::new(),
            init_attempts: AtomicUsize::new(0),
        })
    }

    /// Create an engine with injected providers and store
    ///
    /// Skips backend selection; useful for custom providers and tests.
    pub fn with_components(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationClient>,
        store: VectorStore,
    ) -> Result<Self> {
        config.validate()?;

        let retriever = Retriever::new(
            Arc::clone(&embedder),
            store.clone(),
            config.retrieval.top_k,
        );
        let components = Components {
            embedder,
            generator,
            store,
            retriever,
            splitter: TextSplitter::from_config(&config.chunking),
        };

        Ok(Self {
            config,
            components: OnceCell::new_with(Some(Arc::new(components))),
            init_attempts: AtomicUsize::new(1),
        })
    }

    /// Build components eagerly instead of on first use
    pub async fn init(&self) -> Result<()> {
        self.components().await?;
        Ok(())
    }

    /// Whether components have been built
    pub fn is_initialized(&self) -> bool {
        self.components.initialized()
    }

    async fn components(&self) -> Result<&Arc<Components>> {
        // A failed build leaves the cell empty so a later call can retry.
        self.components
            .get_or_try_init(|| self.build_components())
            .await
    }

    async fn build_components(&self) -> Result<Arc<Components>> {
        self.init_attempts.fetch_add(1, Ordering::SeqCst);

        let api_key = self.config.generation_api_key()?.to_string();

        let embedder: Arc<dyn EmbeddingProvider> = match self.config.embedding.backend {
            EmbeddingBackend::Local => Arc::new(OllamaEmbedder::new(&self.config.embedding)?),
            EmbeddingBackend::Hash => {
                Arc::new(HashEmbedder::new(self.config.embedding.dimensions))
            }
            EmbeddingBackend::Hosted => Arc::new(HostedEmbedder::new(&self.config.embedding)?),
        };
        tracing::info!("Embedding provider ready: {}", embedder.name());

        let generator: Arc<dyn GenerationClient> =
            Arc::new(ChatClient::new(&self.config.generation, &api_key)?);
        tracing::info!(
            "Generation client ready: {} ({})",
            generator.name(),
            self.config.generation.model
        );

        let store = VectorStore::open(
            &self.config.vector_db.storage_path,
            &self.config.vector_db.collection,
        )?;
        tracing::info!(
            "Vector store ready: {} (collection '{}')",
            self.config.vector_db.storage_path.display(),
            store.collection()
        );

        let retriever = Retriever::new(
            Arc::clone(&embedder),
            store.clone(),
            self.config.retrieval.top_k,
        );

        Ok(Arc::new(Components {
            embedder,
            generator,
            store,
            retriever,
            splitter: TextSplitter::from_config(&self.config.chunking),
        }))
    }

    /// Ingest a single file: load, chunk, embed, persist
    ///
    /// Returns the number of chunks written. Unsupported formats and parse
    /// failures surface as errors.
    pub async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let components = self.components().await?;

        let owned = path.to_path_buf();
        let documents =
            tokio::task::spawn_blocking(move || DocumentLoader::load(&owned))
                .await
                .map_err(|e| Error::internal(format!("Loader task failed: {}", e)))??;

        let chunks = components.splitter.split_documents(&documents);
        if chunks.is_empty() {
            tracing::warn!("{} produced no chunks", path.display());
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = components.embedder.embed_batch(&texts).await?;

        let added = components.store.add(chunks, embeddings).await?;
        tracing::info!("Ingested {} ({} chunks)", path.display(), added);
        Ok(added)
    }

    /// Ingest every supported file under a directory
    ///
    /// One bad file never aborts the run: failures are logged and skipped.
    /// The report counts distinct files that produced chunks.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestReport> {
        self.components().await?;

        let files = DocumentLoader::scan(dir)?;
        let mut report = IngestReport::default();

        for file in files {
            match self.ingest_file(&file).await {
                Ok(0) => {}
                Ok(chunks) => {
                    report.files += 1;
                    report.chunks += chunks;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", file.display(), e);
                }
            }
        }

        tracing::info!(
            "Directory ingest finished: {} files, {} chunks",
            report.files,
            report.chunks
        );
        Ok(report)
    }

    /// Similarity search over the ingested chunks
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<ScoredChunk>> {
        let components = self.components().await?;
        components.retriever.search(query, top_k).await
    }

    /// Delete every chunk in the collection. Idempotent.
    pub async fn reset(&self) -> Result<()> {
        let components = self.components().await?;
        let deleted = components.store.delete_all().await?;
        tracing::info!("Collection reset, {} chunks removed", deleted);
        Ok(())
    }

    /// Answer a question using retrieved context and conversation history
    ///
    /// The whole retrieve-assemble-generate sequence runs under the
    /// configured wall-clock budget; exceeding it yields
    /// `Error::GenerationTimeout`, distinct from other generation
    /// failures. Retrieval failures degrade to an ungrounded answer.
    pub async fn invoke(
        &self,
        question: &str,
        history: &[ConversationMessage],
    ) -> Result<RagAnswer> {
        let components = self.components().await?;
        let budget_secs = self.config.rag_timeout_secs;

        let answer_flow = async {
            let retrieved = components.retriever.retrieve(question).await;
            tracing::debug!("Retrieved {} chunks", retrieved.len());

            let prompt = PromptAssembler::assemble(question, &retrieved, history);
            let answer = components.generator.generate(&prompt).await?;
            let sources = dedup_citations(&retrieved);

            Ok(RagAnswer { answer, sources })
        };

        match tokio::time::timeout(Duration::from_secs(budget_secs), answer_flow).await {
            Ok(result) => result,
            Err(_) => Err(Error::GenerationTimeout { budget_secs }),
        }
    }
}
