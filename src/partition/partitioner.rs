//! Context partitioner (§4.3): cuts a bounded context window into the
//! roughly-equal slices that become one LLM sub-request each.

use crate::core::chunk::find_char_boundary;
use crate::core::piece::{ContextPiece, Source};
use crate::core::window::ContextWindow;
use crate::error::{PartitionError, Result};

/// Partitions `window` into `piece_count` roughly-equal, char-boundary-safe
/// pieces, attributing each to the source chunk covering its start offset.
///
/// Empty or whitespace-only pieces are dropped, so the returned `Vec` may
/// have fewer than `piece_count` entries.
///
/// # Errors
///
/// Returns [`PartitionError::EmptyContext`] if `window` has no text.
pub fn partition(window: &ContextWindow, piece_count: usize) -> Result<Vec<ContextPiece>> {
    if window.is_empty() {
        return Err(PartitionError::EmptyContext.into());
    }

    let text = window.text();
    let len = text.len();
    let piece_count = piece_count.max(1);
    let slice_len = len.div_ceil(piece_count);

    let mut pieces = Vec::with_capacity(piece_count);
    let mut start = 0;
    while start < len {
        let raw_end = (start + slice_len).min(len);
        let mut end = find_char_boundary(text, raw_end);
        if end <= start {
            // Backward search collapsed onto `start` (a multi-byte char
            // wider than `slice_len`); advance past that one char instead.
            let next_char_len = text[start..].chars().next().map_or(1, char::len_utf8);
            end = start + next_char_len;
        }
        let slice = &text[start..end];

        if !slice.trim().is_empty() {
            let source = window.position_map().entry_at(start).map_or_else(
                Source::unknown,
                |entry| Source {
                    file_name: entry.chunk.metadata.file_name.clone(),
                    page_number: entry.chunk.metadata.page_number,
                },
            );
            pieces.push(ContextPiece {
                text: slice.to_string(),
                start_char: start,
                end_char: end,
                source,
            });
        }

        start = end;
    }

    Ok(pieces)
}
