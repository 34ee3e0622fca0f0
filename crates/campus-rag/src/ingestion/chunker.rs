//! Recursive text splitting with overlap
//!
//! Splits on the coarsest separator that still produces pieces within the
//! chunk size: paragraph breaks first, then lines, sentences, words, and
//! finally individual graphemes. Pieces are merged back into chunks of at
//! most `chunk_size` characters, and consecutive chunks from the same
//! document share at least `chunk_overlap` characters.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, RawDocument};

/// Separator ladder, coarsest first. Grapheme-level splitting is the
/// implicit last resort.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Recursive character splitter with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a new splitter. `chunk_overlap` must be smaller than
    /// `chunk_size`; configs are validated upstream.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Create a splitter from a chunking config
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split documents into chunks, carrying source metadata onto each
    pub fn split_documents(&self, documents: &[RawDocument]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            for text in self.split_text(&doc.content) {
                chunks.push(Chunk::new(
                    text,
                    doc.metadata.source.clone(),
                    doc.metadata.page,
                ));
            }
        }
        chunks
    }

    /// Split text into overlapping chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let pieces = self.split_recursive(text, &SEPARATORS);
        self.merge_pieces(pieces)
    }

    /// Break text into pieces no larger than `chunk_size`, preferring the
    /// coarsest separator that appears in the text. Separators stay
    /// attached to the preceding piece.
    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some((idx, sep)) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| text.contains(*sep))
            .map(|(i, sep)| (i, *sep))
        else {
            return self.split_by_graphemes(text);
        };

        let remaining = &separators[idx + 1..];
        let mut pieces = Vec::new();

        for part in split_keeping_separator(text, sep) {
            if part.len() <= self.chunk_size {
                pieces.push(part.to_string());
            } else {
                pieces.extend(self.split_recursive(part, remaining));
            }
        }

        pieces
    }

    /// Last-resort split into grapheme windows of at most `chunk_size`
    fn split_by_graphemes(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();

        for grapheme in text.graphemes(true) {
            if !current.is_empty() && current.len() + grapheme.len() > self.chunk_size {
                pieces.push(std::mem::take(&mut current));
            }
            current.push_str(grapheme);
        }
        if !current.is_empty() {
            pieces.push(current);
        }

        pieces
    }

    /// Merge pieces into chunks, seeding each new chunk with the overlap
    /// tail of the previous one
    fn merge_pieces(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for piece in pieces {
            if !current.is_empty() && current.len() + piece.len() > self.chunk_size {
                if !current.trim().is_empty() {
                    chunks.push(current.clone());
                }
                current = self.overlap_tail(&current);
                // A large piece may not fit after the full overlap; shrink
                // the seed so the size bound keeps holding.
                if current.len() + piece.len() > self.chunk_size {
                    current = tail_at_most(&current, self.chunk_size.saturating_sub(piece.len()));
                }
            }
            current.push_str(&piece);
        }

        if !current.trim().is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Last `chunk_overlap` characters of a chunk, adjusted to a char
    /// boundary
    fn overlap_tail(&self, text: &str) -> String {
        tail_at_most(text, self.chunk_overlap)
    }
}

/// Suffix of at most `limit` bytes, adjusted forward to a char boundary
fn tail_at_most(text: &str, limit: usize) -> String {
    if limit == 0 {
        return String::new();
    }
    if text.len() <= limit {
        return text.to_string();
    }

    let mut start = text.len() - limit;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

/// Split on a separator, keeping the separator attached to the piece
/// before it
fn split_keeping_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = text;

    while let Some(idx) = rest.find(sep) {
        let (head, tail) = rest.split_at(idx + sep.len());
        parts.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        parts.push(rest);
    }

    parts
}
