//! Retrieval and answer result types

use serde::{Deserialize, Serialize};

use super::document::Chunk;

/// Number of characters kept in a citation preview
pub const PREVIEW_CHARS: usize = 200;

/// A chunk with its similarity score
///
/// Scores are cosine similarity, higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The stored chunk
    pub chunk: Chunk,
    /// Cosine similarity against the query
    pub score: f32,
}

/// A source cited in an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceCitation {
    /// Display label, e.g. `guide.pdf (p.3)`
    pub label: String,
    /// Preview of the cited content
    pub preview: String,
}

impl SourceCitation {
    /// Build a citation from a retrieved chunk
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            label: chunk.source_label(),
            preview: preview_of(&chunk.content),
        }
    }
}

/// Truncate text to a short preview, respecting char boundaries
pub fn preview_of(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Final answer to a question, with the sources it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    /// Generated answer text
    pub answer: String,
    /// Sources in retrieval rank order, deduplicated by label
    pub sources: Vec<SourceCitation>,
}

/// Summary of a directory ingestion run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Distinct files that produced at least one chunk
    pub files: usize,
    /// Total chunks written to the store
    pub chunks: usize,
}
