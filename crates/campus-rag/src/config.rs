//! Configuration for the engine
//!
//! Defaults work for a local setup; `RagConfig::from_env` applies the
//! environment overrides used in deployments.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Generation (LLM) configuration
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Vector database configuration
    #[serde(default)]
    pub vector_db: VectorDbConfig,
    /// Wall-clock budget for answering a question, in seconds
    #[serde(default = "default_rag_timeout")]
    pub rag_timeout_secs: u64,
}

fn default_rag_timeout() -> u64 {
    30
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            vector_db: VectorDbConfig::default(),
            rag_timeout_secs: default_rag_timeout(),
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local model served by Ollama
    #[default]
    Local,
    /// Deterministic feature-hashing embedder, no model required
    Hash,
    /// Hosted OpenAI-compatible embeddings API
    Hosted,
}

impl EmbeddingBackend {
    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "local" | "ollama" => Ok(Self::Local),
            "hash" => Ok(Self::Hash),
            "hosted" | "api" => Ok(Self::Hosted),
            other => Err(Error::config(format!(
                "Unknown embedding backend '{}' (expected local, hash or hosted)",
                other
            ))),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Which embedding backend to use
    #[serde(default)]
    pub backend: EmbeddingBackend,
    /// Model name (ignored by the hash backend)
    pub model: String,
    /// Base URL of the embedding server
    pub base_url: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// API key for the hosted backend
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Local,
            model: "nomic-embed-text".to_string(),
            base_url: "http://localhost:11434".to_string(),
            dimensions: 768,
            api_key: None,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of chunks to retrieve
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Generation (LLM) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible chat API
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// API key, required before the engine can answer questions
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key: None,
            temperature: 0.3,
            timeout_secs: 30,
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Storage path for the SQLite database
    pub storage_path: PathBuf,
    /// Collection name chunks are written to
    pub collection: String,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        let storage_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("campus-rag")
            .join("vectors.db");

        Self {
            storage_path,
            collection: "university_docs".to_string(),
        }
    }
}

impl RagConfig {
    /// Build a configuration from environment variables, starting from defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(backend) = std::env::var("EMBEDDING_BACKEND") {
            config.embedding.backend = EmbeddingBackend::from_str(&backend)?;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url;
        }
        if let Ok(dims) = std::env::var("EMBEDDING_DIMENSIONS") {
            config.embedding.dimensions = parse_env("EMBEDDING_DIMENSIONS", &dims)?;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(key);
        }

        if let Ok(size) = std::env::var("CHUNK_SIZE") {
            config.chunking.chunk_size = parse_env("CHUNK_SIZE", &size)?;
        }
        if let Ok(overlap) = std::env::var("CHUNK_OVERLAP") {
            config.chunking.chunk_overlap = parse_env("CHUNK_OVERLAP", &overlap)?;
        }
        if let Ok(top_k) = std::env::var("TOP_K") {
            config.retrieval.top_k = parse_env("TOP_K", &top_k)?;
        }

        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            config.generation.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.generation.model = model;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.generation.base_url = url;
        }
        if let Ok(timeout) = std::env::var("LLM_TIMEOUT") {
            config.generation.timeout_secs = parse_env("LLM_TIMEOUT", &timeout)?;
        }
        if let Ok(timeout) = std::env::var("RAG_TIMEOUT") {
            config.rag_timeout_secs = parse_env("RAG_TIMEOUT", &timeout)?;
        }

        if let Ok(path) = std::env::var("VECTOR_DB_PATH") {
            config.vector_db.storage_path = PathBuf::from(path);
        }
        if let Ok(collection) = std::env::var("VECTOR_COLLECTION") {
            config.vector_db.collection = collection;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants
    ///
    /// The generation API key is checked later, when the engine components
    /// are first built, so that ingest-only runs can omit it during
    /// validation of everything else.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than zero"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("top_k must be greater than zero"));
        }
        if self.rag_timeout_secs == 0 {
            return Err(Error::config("rag_timeout_secs must be greater than zero"));
        }
        if self.vector_db.collection.trim().is_empty() {
            return Err(Error::config("vector collection name must not be empty"));
        }
        Ok(())
    }

    /// API key for answer generation, or a configuration error
    pub fn generation_api_key(&self) -> Result<&str> {
        match self.generation.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::config(
                "GROQ_API_KEY is not configured; set it in the environment or .env file",
            )),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("Invalid value '{}' for {}", value, name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.vector_db.collection, "university_docs");
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let config = RagConfig::default();
        assert!(matches!(
            config.generation_api_key(),
            Err(Error::Config(_))
        ));

        let mut config = RagConfig::default();
        config.generation.api_key = Some("  ".to_string());
        assert!(config.generation_api_key().is_err());

        config.generation.api_key = Some("gsk_test".to_string());
        assert_eq!(config.generation_api_key().unwrap(), "gsk_test");
    }

    #[test]
    fn backend_parses_known_names() {
        assert_eq!(
            EmbeddingBackend::from_str("ollama").unwrap(),
            EmbeddingBackend::Local
        );
        assert_eq!(
            EmbeddingBackend::from_str("HASH").unwrap(),
            EmbeddingBackend::Hash
        );
        assert!(EmbeddingBackend::from_str("chroma").is_err());
    }
}
