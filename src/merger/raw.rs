//! Dynamic-JSON-shape tolerance (§9): a piece's LLM output may be a bare
//! array or an object wrapping the array under a conventional key. This
//! module normalizes either shape once, at the Merger's entry point, into a
//! small internal representation the merge rules operate on uniformly.

use crate::error::{MergeError, Result};
use serde_json::{Map, Value};

/// A piece's output, normalized to one of two shapes.
#[derive(Debug, Clone)]
pub enum RawPieceOutput {
    /// A bare JSON array.
    Array(Vec<Value>),
    /// A JSON object (scalars, or a wrapper around an array under a
    /// conventional key).
    Object(Map<String, Value>),
}

/// Normalizes a parsed LLM response into a [`RawPieceOutput`].
///
/// # Errors
///
/// Returns [`MergeError::UnrecognizedShape`] if `value` is neither an array
/// nor an object (e.g. a bare string or number).
pub fn normalize(value: Value, piece_index: usize) -> Result<RawPieceOutput> {
    match value {
        Value::Array(items) => Ok(RawPieceOutput::Array(items)),
        Value::Object(map) => Ok(RawPieceOutput::Object(map)),
        other => Err(MergeError::UnrecognizedShape {
            piece_index,
            description: format!("expected a JSON array or object, got {other}"),
        }
        .into()),
    }
}

/// Looks up an array under any of `keys`, unwrapping a top-level array
/// output directly (a bare array is treated as already being "the list").
pub fn find_array<'a>(output: &'a RawPieceOutput, keys: &[&str]) -> Option<&'a Vec<Value>> {
    match output {
        RawPieceOutput::Array(items) => Some(items),
        RawPieceOutput::Object(map) => keys.iter().find_map(|key| map.get(*key)?.as_array()),
    }
}

/// Looks up a string scalar under any of `keys` in an object output.
pub fn find_str<'a>(output: &'a RawPieceOutput, keys: &[&str]) -> Option<&'a str> {
    match output {
        RawPieceOutput::Array(_) => None,
        RawPieceOutput::Object(map) => keys.iter().find_map(|key| map.get(*key)?.as_str()),
    }
}
