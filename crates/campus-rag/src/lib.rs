//! campus-rag: retrieval-augmented question answering over campus documents
//!
//! Ingests PDF, Word, text, and markdown files into a persistent vector
//! store, retrieves the most relevant chunks for a question, and asks an
//! LLM to answer from those excerpts with source citations. Embedding and
//! generation backends are swappable behind provider traits.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use engine::RagEngine;
pub use error::{Error, Result};
pub use types::{
    conversation::{ConversationMessage, Role},
    document::{Chunk, FileType, RawDocument},
    response::{IngestReport, RagAnswer, ScoredChunk, SourceCitation},
};
