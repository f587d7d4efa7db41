//! Context pieces: the unit of work for a single LLM sub-request.

use serde::{Deserialize, Serialize};

/// Source attribution carried by every piece (and, downstream, by every
/// element the piece's sub-request produces).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Human-readable file name.
    pub file_name: String,
    /// User-facing page number, if known.
    pub page_number: Option<u32>,
}

impl Source {
    /// The fallback attribution used when a piece cannot be matched against
    /// the position map.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            file_name: "Unknown".to_string(),
            page_number: None,
        }
    }
}

/// A small slice of the context window, the unit of work processed by
/// exactly one LLM sub-request.
#[derive(Debug, Clone)]
pub struct ContextPiece {
    /// The piece's text.
    pub text: String,
    /// Start offset within the owning context window.
    pub start_char: usize,
    /// End offset within the owning context window.
    pub end_char: usize,
    /// Attribution derived from the position map at `start_char`.
    pub source: Source,
}

impl ContextPiece {
    /// Whether the piece's text is empty or whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unknown() {
        let source = Source::unknown();
        assert_eq!(source.file_name, "Unknown");
        assert!(source.page_number.is_none());
    }

    #[test]
    fn test_piece_is_blank() {
        let piece = ContextPiece {
            text: "   ".to_string(),
            start_char: 0,
            end_char: 3,
            source: Source::unknown(),
        };
        assert!(piece.is_blank());
    }
}
