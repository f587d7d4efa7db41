//! Context window assembly: bounding and positioning retrieved chunks.
//!
//! The orchestrator concatenates retrieved chunks into a single bounded
//! string (the [`ContextWindow`]) while recording exactly which byte range
//! of that string each chunk contributed (the [`ChunkPositionMap`]). The
//! partitioner later consults the position map to attribute each piece back
//! to a source file and page.

use crate::core::Chunk;
use std::ops::Range;

/// Delimiter inserted between consecutive chunks in a context window.
pub const CHUNK_DELIMITER: &str = "\n\n";

/// A single entry in a [`ChunkPositionMap`]: the byte range within the
/// context window that one chunk's contribution (delimiter included, except
/// for the first entry) occupies.
#[derive(Debug, Clone)]
pub struct PositionMapEntry {
    /// Byte range within the owning context window.
    pub range: Range<usize>,
    /// The chunk that produced this range.
    pub chunk: Chunk,
}

/// Maps byte ranges of a [`ContextWindow`] back to the chunks that produced
/// them.
///
/// Invariant: entries are non-overlapping, contiguous, and sorted by
/// `range.start`.
#[derive(Debug, Clone, Default)]
pub struct ChunkPositionMap {
    entries: Vec<PositionMapEntry>,
}

impl ChunkPositionMap {
    /// Creates an empty position map.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn push(&mut self, range: Range<usize>, chunk: Chunk) {
        self.entries.push(PositionMapEntry { range, chunk });
    }

    /// Finds the entry whose range contains `offset`.
    ///
    /// Falls back to the first entry if none contains the offset directly
    /// (per the Context Partitioner's documented fallback behavior), and
    /// returns `None` only when the map itself is empty.
    #[must_use]
    pub fn entry_at(&self, offset: usize) -> Option<&PositionMapEntry> {
        self.entries
            .iter()
            .find(|e| e.range.contains(&offset))
            .or_else(|| self.entries.first())
    }

    /// Returns all entries in window order.
    #[must_use]
    pub fn entries(&self) -> &[PositionMapEntry] {
        &self.entries
    }

    /// Returns `true` if no chunks were accepted into the window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The bounded, delimiter-joined concatenation of retrieved chunk texts used
/// as the source material for context partitioning.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    text: String,
    position_map: ChunkPositionMap,
}

impl ContextWindow {
    /// Builds a context window from retrieved chunks in order, stopping
    /// before any chunk whose inclusion would exceed `max_chars`.
    ///
    /// A chunk is either wholly included or wholly excluded — the window
    /// never truncates mid-chunk.
    #[must_use]
    pub fn build(chunks: impl IntoIterator<Item = Chunk>, max_chars: usize) -> Self {
        let mut text = String::new();
        let mut position_map = ChunkPositionMap::new();

        for chunk in chunks {
            let delimiter = if text.is_empty() { "" } else { CHUNK_DELIMITER };
            let candidate_len = text.len() + delimiter.len() + chunk.text.len();
            if candidate_len > max_chars {
                break;
            }
            let start = text.len();
            text.push_str(delimiter);
            text.push_str(&chunk.text);
            let end = text.len();
            position_map.push(start..end, chunk);
        }

        Self { text, position_map }
    }

    /// The assembled window text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The position map describing which chunk produced each byte range.
    #[must_use]
    pub const fn position_map(&self) -> &ChunkPositionMap {
        &self.position_map
    }

    /// The window's length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the window has no content (no chunks were accepted).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Distinct `(file_name, page_number)` references across every chunk
    /// that contributed to this window, used to build citation text.
    #[must_use]
    pub fn source_references(&self) -> Vec<(String, Option<u32>)> {
        let mut seen = std::collections::BTreeSet::new();
        for entry in self.position_map.entries() {
            seen.insert((
                entry.chunk.metadata.file_name.clone(),
                entry.chunk.metadata.page_number,
            ));
        }
        seen.into_iter().collect()
    }
}
