//! Provider traits and backend implementations

pub mod embedding;
pub mod hash;
pub mod hosted;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use hash::HashEmbedder;
pub use hosted::HostedEmbedder;
pub use llm::GenerationClient;
pub use ollama::OllamaEmbedder;
