//! Core types shared across the engine

pub mod conversation;
pub mod document;
pub mod response;

pub use conversation::{ConversationMessage, Role};
pub use document::{Chunk, DocumentMetadata, FileType, RawDocument};
pub use response::{IngestReport, RagAnswer, ScoredChunk, SourceCitation};
