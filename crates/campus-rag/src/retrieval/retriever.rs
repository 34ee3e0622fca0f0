//! Query-time retrieval
//!
//! Embeds the query and runs a similarity search against the store. When
//! used inside question answering, retrieval failures degrade to an empty
//! result so the engine can still answer ungrounded.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::storage::VectorStore;
use crate::types::ScoredChunk;

/// Retrieves the chunks most relevant to a query
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: VectorStore,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever with a default `top_k`
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: VectorStore, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    /// Search for the chunks most similar to the query
    ///
    /// Errors surface to the caller; use `retrieve` for the degrading
    /// variant.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<ScoredChunk>> {
        let k = top_k.unwrap_or(self.top_k);
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| Error::retrieval(format!("Query embedding failed: {}", e)))?;

        self.store
            .query(embedding, k)
            .await
            .map_err(|e| Error::retrieval(format!("Vector search failed: {}", e)))
    }

    /// Search, degrading to an empty result on failure
    ///
    /// Question answering must keep working when the store or embedder is
    /// down; failures are logged and an empty context is returned.
    pub async fn retrieve(&self, query: &str) -> Vec<ScoredChunk> {
        match self.search(query, None).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Retrieval degraded to empty context: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HashEmbedder;
    use crate::types::Chunk;
    use std::path::PathBuf;

    async fn seeded_retriever() -> Retriever {
        let embedder = Arc::new(HashEmbedder::default());
        let store = VectorStore::in_memory("docs").unwrap();

        let texts = [
            "The library opens at eight in the morning.",
            "Tuition fees are due in September.",
            "The gym offers free classes for students.",
        ];
        let chunks: Vec<Chunk> = texts
            .iter()
            .map(|t| Chunk::new(t.to_string(), PathBuf::from("campus.txt"), None))
            .collect();
        let mut embeddings = Vec::new();
        for text in &texts {
            embeddings.push(embedder.embed(text).await.unwrap());
        }
        store.add(chunks, embeddings).await.unwrap();

        Retriever::new(embedder, store, 2)
    }

    #[tokio::test]
    async fn search_ranks_by_similarity() {
        let retriever = seeded_retriever().await;

        let results = retriever
            .search("when does the library open", None)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].chunk.content.contains("library"));
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn explicit_top_k_overrides_the_default() {
        let retriever = seeded_retriever().await;
        let results = retriever.search("students", Some(1)).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn retrieve_degrades_to_empty_on_failure() {
        struct FailingEmbedder;

        #[async_trait::async_trait]
        impl EmbeddingProvider for FailingEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Err(Error::embedding("backend down"))
            }
            fn dimensions(&self) -> usize {
                4
            }
            async fn health_check(&self) -> Result<bool> {
                Ok(false)
            }
            fn name(&self) -> &str {
                "failing"
            }
        }

        let store = VectorStore::in_memory("docs").unwrap();
        let retriever = Retriever::new(Arc::new(FailingEmbedder), store, 4);

        assert!(retriever.retrieve("anything").await.is_empty());
        assert!(matches!(
            retriever.search("anything", None).await,
            Err(Error::Retrieval(_))
        ));
    }
}
