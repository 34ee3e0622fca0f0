//! Source citations for answers

use std::collections::HashSet;

use crate::types::{ScoredChunk, SourceCitation};

/// Build the source list for an answer
///
/// Retrieval can return several chunks from the same file; the answer
/// should cite each source once. Deduplicates by label and keeps the
/// retrieval rank order of first appearance.
pub fn dedup_citations(retrieved: &[ScoredChunk]) -> Vec<SourceCitation> {
    let mut seen = HashSet::new();
    let mut citations = Vec::new();

    for result in retrieved {
        let citation = SourceCitation::from_chunk(&result.chunk);
        if seen.insert(citation.label.clone()) {
            citations.push(citation);
        }
    }

    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;
    use std::path::PathBuf;

    fn scored(source: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(format!("content of {}", source), PathBuf::from(source), None),
            score,
        }
    }

    #[test]
    fn dedup_preserves_rank_order() {
        let retrieved = vec![
            scored("a.pdf", 0.9),
            scored("b.txt", 0.8),
            scored("a.pdf", 0.7),
            scored("c.md", 0.6),
        ];

        let labels: Vec<String> = dedup_citations(&retrieved)
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, vec!["a.pdf", "b.txt", "c.md"]);
    }

    #[test]
    fn pages_of_the_same_file_are_distinct_sources() {
        let mut first = scored("guide.pdf", 0.9);
        first.chunk.page = Some(0);
        let mut second = scored("guide.pdf", 0.8);
        second.chunk.page = Some(1);

        let citations = dedup_citations(&[first, second]);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].label, "guide.pdf (p.1)");
        assert_eq!(citations[1].label, "guide.pdf (p.2)");
    }

    #[test]
    fn empty_retrieval_gives_no_citations() {
        assert!(dedup_citations(&[]).is_empty());
    }
}
