//! Document and chunk types with source tracking for citations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx, .doc)
    Docx,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" | "doc" => Self::Docx,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Metadata attached to a loaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Path the document was loaded from
    pub source: PathBuf,
    /// Page number (zero-based, PDFs only)
    pub page: Option<u32>,
    /// Total pages in the source file (if applicable)
    pub total_pages: Option<u32>,
    /// SHA-256 hash of the content
    pub content_hash: String,
}

/// A raw document produced by the loader, before chunking
///
/// A single file may yield several raw documents; PDFs yield one per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    /// Extracted text content
    pub content: String,
    /// Source metadata
    pub metadata: DocumentMetadata,
}

impl RawDocument {
    /// Create a raw document with a computed content hash
    pub fn new(content: String, source: PathBuf, page: Option<u32>, total_pages: Option<u32>) -> Self {
        let content_hash = hash_content(&content);
        Self {
            content,
            metadata: DocumentMetadata {
                source,
                page,
                total_pages,
                content_hash,
            },
        }
    }
}

/// A chunk of text ready for embedding and storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Text content
    pub content: String,
    /// Path of the file this chunk came from
    pub source: PathBuf,
    /// Page number (zero-based, PDFs only)
    pub page: Option<u32>,
    /// Ingestion timestamp
    pub ingested_at: DateTime<Utc>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(content: String, source: PathBuf, page: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            source,
            page,
            ingested_at: Utc::now(),
        }
    }

    /// Human-readable source label, e.g. `guide.pdf (p.3)`
    ///
    /// Pages are shown 1-based even though they are stored 0-based.
    pub fn source_label(&self) -> String {
        let filename = self
            .source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        match self.page {
            Some(page) => format!("{} (p.{})", filename, page + 1),
            None => filename.to_string(),
        }
    }
}

/// Hash content with SHA-256
pub fn hash_content(content: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_detection_is_case_insensitive() {
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("Md"), FileType::Markdown);
        assert_eq!(FileType::from_extension("doc"), FileType::Docx);
        assert_eq!(FileType::from_extension("xlsx"), FileType::Unknown);
        assert!(!FileType::from_extension("csv").is_supported());
    }

    #[test]
    fn source_label_shows_pages_one_based() {
        let chunk = Chunk::new("text".into(), PathBuf::from("/docs/guide.pdf"), Some(2));
        assert_eq!(chunk.source_label(), "guide.pdf (p.3)");

        let chunk = Chunk::new("text".into(), PathBuf::from("/docs/notes.md"), None);
        assert_eq!(chunk.source_label(), "notes.md");
    }

    #[test]
    fn raw_document_hashes_content() {
        let a = RawDocument::new("same".into(), PathBuf::from("a.txt"), None, None);
        let b = RawDocument::new("same".into(), PathBuf::from("b.txt"), None, None);
        let c = RawDocument::new("other".into(), PathBuf::from("c.txt"), None, None);
        assert_eq!(a.metadata.content_hash, b.metadata.content_hash);
        assert_ne!(a.metadata.content_hash, c.metadata.content_hash);
    }
}
