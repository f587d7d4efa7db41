//! Chunk representation returned by the vector store.
//!
//! A chunk is a retrieval unit: a contiguous span of text from one ingested
//! document, carrying the provenance metadata (file name, page number) that
//! flows through partitioning and merging into the final artifact.

use serde::{Deserialize, Serialize};

/// A retrieval unit returned by the vector store.
///
/// # Examples
///
/// ```
/// use rag_orchestrator::core::Chunk;
///
/// let chunk = Chunk::new(1, "doc-A".to_string(), "Replace the filter.".to_string(), 0);
/// assert_eq!(chunk.metadata.file_id, "doc-A");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (assigned by the vector store).
    pub id: i64,

    /// Chunk text content.
    pub text: String,

    /// Sequential index within its source document (0-based).
    pub chunk_index: usize,

    /// Relevance score assigned by the retrieval call, if any.
    pub score: Option<f32>,

    /// Provenance and retrieval metadata.
    pub metadata: ChunkMetadata,
}

/// Provenance metadata attached to a chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Identifier of the source document.
    pub file_id: String,

    /// Human-readable source file name, used in citations.
    pub file_name: String,

    /// User-facing page number, if the backing store tracked one.
    pub page_number: Option<u32>,

    /// Page range as a display string (e.g. `"4-5"`), if the chunk spans pages.
    pub page_range: Option<String>,

    /// Internal page index, when distinct from the number a reader would cite.
    pub display_page_number: Option<u32>,
}

impl Chunk {
    /// Creates a new chunk with the minimum required provenance fields set.
    #[must_use]
    pub fn new(id: i64, file_id: String, text: String, chunk_index: usize) -> Self {
        Self {
            id,
            text,
            chunk_index,
            score: None,
            metadata: ChunkMetadata {
                file_id,
                ..Default::default()
            },
        }
    }

    /// Sets the human-readable file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.metadata.file_name = file_name.into();
        self
    }

    /// Sets the user-facing page number.
    #[must_use]
    pub const fn with_page_number(mut self, page_number: u32) -> Self {
        self.metadata.page_number = Some(page_number);
        self
    }

    /// Sets the retrieval score.
    #[must_use]
    pub const fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Returns the size of the chunk's text in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.text.len()
    }

    /// Checks if the chunk's text is empty or whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Finds a valid UTF-8 character boundary at or before the given position.
///
/// Used throughout partitioning to avoid splitting multi-byte characters
/// when cutting the context window into pieces.
#[must_use]
pub fn find_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut boundary = pos;
    while !s.is_char_boundary(boundary) && boundary > 0 {
        boundary -= 1;
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_new() {
        let chunk = Chunk::new(1, "doc-A".to_string(), "hello".to_string(), 0);
        assert_eq!(chunk.id, 1);
        assert_eq!(chunk.metadata.file_id, "doc-A");
        assert_eq!(chunk.chunk_index, 0);
        assert!(chunk.score.is_none());
    }

    #[test]
    fn test_chunk_builder_methods() {
        let chunk = Chunk::new(1, "doc-A".to_string(), "hello".to_string(), 0)
            .with_file_name("manual.pdf")
            .with_page_number(4)
            .with_score(0.87);
        assert_eq!(chunk.metadata.file_name, "manual.pdf");
        assert_eq!(chunk.metadata.page_number, Some(4));
        assert_eq!(chunk.score, Some(0.87));
    }

    #[test]
    fn test_chunk_is_blank() {
        let blank = Chunk::new(1, "doc-A".to_string(), "   \n\t".to_string(), 0);
        assert!(blank.is_blank());
        let not_blank = Chunk::new(1, "doc-A".to_string(), "content".to_string(), 0);
        assert!(!not_blank.is_blank());
    }

    #[test]
    fn test_find_char_boundary_ascii() {
        assert_eq!(find_char_boundary("hello", 3), 3);
        assert_eq!(find_char_boundary("hello", 100), 5);
    }

    #[test]
    fn test_find_char_boundary_unicode() {
        let s = "Hello世界";
        // "世" starts at byte 5 and is 3 bytes long; byte 6 is mid-character.
        assert_eq!(find_char_boundary(s, 6), 5);
    }

    #[test]
    fn test_chunk_serialization_roundtrip() {
        let chunk = Chunk::new(1, "doc-A".to_string(), "hello".to_string(), 0)
            .with_file_name("manual.pdf")
            .with_page_number(4);
        let json = serde_json::to_string(&chunk).unwrap();
        let restored: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, chunk);
    }
}
