//! Extracting a JSON value from raw LLM text output (§4.2).
//!
//! LLMs asked for "JSON only" still occasionally wrap their answer in a
//! fenced code block, or pad it with a sentence of preamble. This module
//! applies the two tolerances the contract specifies, in order, before
//! attempting a strict parse.

use crate::error::{LlmError, Result};
use serde_json::Value;

/// Extracts and strictly parses a JSON value from raw LLM text.
///
/// 1. Trims surrounding whitespace.
/// 2. If fenced in a ``` or ```json code block, strips the fence.
/// 3. Otherwise, isolates the substring from the first `{`/`[` to the last
///    matching `}`/`]`.
/// 4. Parses the result strictly; any failure is reported as
///    [`LlmError::InvalidJson`].
pub fn extract_json(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    let unfenced = strip_fence(trimmed);
    let candidate = isolate_json_substring(unfenced).unwrap_or(unfenced);

    serde_json::from_str(candidate)
        .map_err(|e| LlmError::InvalidJson(format!("{e}: {candidate}")).into())
}

fn strip_fence(text: &str) -> &str {
    let Some(after_open) = text.strip_prefix("```") else {
        return text;
    };
    // Skip an optional language tag on the fence's opening line (e.g. "json").
    let after_tag = after_open
        .find('\n')
        .map_or(after_open, |i| &after_open[i + 1..]);
    after_tag.strip_suffix("```").unwrap_or(after_tag).trim()
}

fn isolate_json_substring(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let opening = text.as_bytes()[start];
    let closing = if opening == b'{' { b'}' } else { b']' };
    let end = text.rfind(closing as char)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_json() {
        let value = extract_json(r#"{"title": "Replace filter"}"#).unwrap();
        assert_eq!(value["title"], "Replace filter");
    }

    #[test]
    fn test_extract_fenced_json() {
        let raw = "```json\n{\"title\": \"Replace filter\"}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["title"], "Replace filter");
    }

    #[test]
    fn test_extract_bare_fence_no_language_tag() {
        let raw = "```\n[1, 2, 3]\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_extract_with_preamble_text() {
        let raw = "Here is the JSON you requested:\n{\"steps\": []}\nLet me know if you need more.";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["steps"], serde_json::json!([]));
    }

    #[test]
    fn test_extract_bare_array() {
        let value = extract_json(r#"[{"a": 1}, {"a": 2}]"#).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn test_extract_invalid_json_errors() {
        let result = extract_json("not json at all");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), crate::error::Error::Llm(LlmError::InvalidJson(_))));
    }

    #[test]
    fn test_extract_malformed_inside_braces_errors() {
        let result = extract_json("{not: valid, json}");
        assert!(result.is_err());
    }
}
