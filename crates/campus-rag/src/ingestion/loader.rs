//! Multi-format document loader
//!
//! Dispatches on file extension and returns one or more `RawDocument`s per
//! file. PDFs are split page by page so citations can point at a page.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{FileType, RawDocument};

/// Loads files into raw documents
pub struct DocumentLoader;

impl DocumentLoader {
    /// Check whether a path has a loadable extension
    pub fn is_supported(path: &Path) -> bool {
        FileType::from_path(path).is_supported()
    }

    /// Load a single file
    ///
    /// Returns `Error::UnsupportedFormat` for unknown extensions and
    /// `Error::FileParse` when extraction fails or yields no text.
    pub fn load(path: &Path) -> Result<Vec<RawDocument>> {
        let file_type = FileType::from_path(path);
        if !file_type.is_supported() {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)");
            return Err(Error::UnsupportedFormat(ext.to_string()));
        }

        let data = std::fs::read(path)?;

        match file_type {
            FileType::Pdf => Self::load_pdf(path, &data),
            FileType::Docx => Self::load_docx(path, &data),
            FileType::Txt | FileType::Markdown => Self::load_text(path, &data),
            FileType::Unknown => unreachable!("checked above"),
        }
    }

    /// Load every supported file under a directory
    ///
    /// Files that are unsupported or fail to parse are logged and skipped;
    /// the scan never aborts because of one bad file.
    pub fn load_directory(dir: &Path) -> Result<Vec<RawDocument>> {
        let mut documents = Vec::new();
        for path in Self::scan(dir)? {
            match Self::load(&path) {
                Ok(docs) => documents.extend(docs),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                }
            }
        }
        Ok(documents)
    }

    /// Collect the supported files under a directory
    pub fn scan(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Directory not found: {}", dir.display()),
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if Self::is_supported(path) {
                files.push(path.to_path_buf());
            } else {
                tracing::warn!("Skipping unsupported file: {}", path.display());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Load a PDF page by page
    ///
    /// Falls back to whole-document extraction (as page 0) when page-level
    /// extraction produces nothing.
    fn load_pdf(path: &Path, data: &[u8]) -> Result<Vec<RawDocument>> {
        let filename = file_name(path);

        if let Ok(doc) = lopdf::Document::load_mem(data) {
            let pages = doc.get_pages();
            let total_pages = pages.len() as u32;
            let mut documents = Vec::new();

            for (page_num, _object_id) in pages {
                match doc.extract_text(&[page_num]) {
                    Ok(text) => {
                        let text = normalize_text(&text);
                        if text.is_empty() {
                            continue;
                        }
                        documents.push(RawDocument::new(
                            text,
                            path.to_path_buf(),
                            // lopdf pages are 1-based
                            Some(page_num - 1),
                            Some(total_pages),
                        ));
                    }
                    Err(e) => {
                        tracing::debug!("No text on page {} of {}: {}", page_num, filename, e);
                    }
                }
            }

            if !documents.is_empty() {
                return Ok(documents);
            }
            tracing::warn!(
                "Page-level extraction produced no text for {}, trying whole-document fallback",
                filename
            );
        }

        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(&filename, format!("PDF extraction failed: {}", e)))?;
        let text = normalize_text(&text);
        if text.is_empty() {
            return Err(Error::file_parse(
                &filename,
                "No text content could be extracted from PDF",
            ));
        }

        Ok(vec![RawDocument::new(
            text,
            path.to_path_buf(),
            Some(0),
            None,
        )])
    }

    /// Load a DOCX file by walking its paragraph runs
    fn load_docx(path: &Path, data: &[u8]) -> Result<Vec<RawDocument>> {
        let filename = file_name(path);
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(&filename, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        let content = normalize_text(&content);
        if content.is_empty() {
            return Err(Error::file_parse(&filename, "Document contains no text"));
        }

        Ok(vec![RawDocument::new(content, path.to_path_buf(), None, None)])
    }

    /// Load plain text or markdown
    fn load_text(path: &Path, data: &[u8]) -> Result<Vec<RawDocument>> {
        let content = String::from_utf8_lossy(data).replace('\0', "");
        if content.trim().is_empty() {
            return Err(Error::file_parse(file_name(path), "File is empty"));
        }
        Ok(vec![RawDocument::new(content, path.to_path_buf(), None, None)])
    }
}

/// Strip nulls and collapse blank-line runs left behind by extractors
fn normalize_text(text: &str) -> String {
    let cleaned = text.replace('\0', "");
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;

    for line in cleaned.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run == 1 {
                lines.push("");
            }
        } else {
            blank_run = 0;
            lines.push(line);
        }
    }

    lines.join("\n").trim().to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faq.txt");
        std::fs::write(&path, "How do I enroll?\n\nVisit the registrar.").unwrap();

        let docs = DocumentLoader::load(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.contains("registrar"));
        assert_eq!(docs[0].metadata.page, None);
        assert_eq!(docs[0].metadata.source, path);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a,b,c").unwrap();

        let err = DocumentLoader::load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn empty_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.md");
        std::fs::write(&path, "   \n  ").unwrap();

        let err = DocumentLoader::load(&path).unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }

    #[test]
    fn directory_scan_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "first document body").unwrap();
        std::fs::write(dir.path().join("b.md"), "# second document").unwrap();
        std::fs::write(dir.path().join("ignore.xlsx"), "binary junk").unwrap();
        // A PDF with garbage content fails to parse but must not abort the scan
        let mut bad = std::fs::File::create(dir.path().join("broken.pdf")).unwrap();
        bad.write_all(b"not a real pdf").unwrap();

        let docs = DocumentLoader::load_directory(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = DocumentLoader::load_directory(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn normalize_collapses_blank_runs() {
        let text = "line one\n\n\n\nline two\n";
        assert_eq!(normalize_text(text), "line one\n\nline two");
    }
}
