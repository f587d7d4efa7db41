//! Output formatting for CLI commands.
//!
//! Supports text, JSON, and NDJSON output formats.

use crate::config::OrchestratorConfig;
use crate::core::artifact::{Artifact, GenerationResult};
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
    /// Newline-delimited JSON (NDJSON) for streaming.
    Ndjson,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" | "stream" => Self::Ndjson,
            _ => Self::Text,
        }
    }
}

/// Formats a completed generation result.
#[must_use]
pub fn format_generation_result(result: &GenerationResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_generation_result_text(result),
        OutputFormat::Json | OutputFormat::Ndjson => format_json(result),
    }
}

fn format_generation_result_text(result: &GenerationResult) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Use case:     {}", result.use_case);
    let _ = writeln!(output, "Documents:    {}", result.document_ids.join(", "));
    let _ = writeln!(output, "Chunks used:  {}", result.chunks_used);
    let _ = writeln!(output, "Context size: {} chars", result.context_length);
    let _ = writeln!(output, "Duration:     {:.2}s", result.processing_time_seconds);
    let _ = writeln!(output, "LLM calls:    {}", result.generation_metadata.call_count);
    output.push_str("Sources:\n");
    output.push_str(&result.citation_text);
    output.push_str("\n\n");

    match &result.data {
        Artifact::Checksheet(sheet) => {
            let _ = writeln!(output, "Checksheet ({} items):", sheet.items.len());
            for item in &sheet.items {
                let _ = writeln!(
                    output,
                    "  - {} [{:?}] {} ({}{})",
                    item.item_name,
                    item.frequency,
                    item.expected_status,
                    item.source_file,
                    item.source_page.map_or_else(String::new, |p| format!(" p.{p}"))
                );
            }
        }
        Artifact::WorkInstructions(wi) => {
            let _ = writeln!(output, "Work Instructions: {}", wi.title);
            let _ = writeln!(output, "{}", wi.overview);
            for step in &wi.steps {
                let _ = writeln!(output, "  {}. {}", step.step_number, step.description);
            }
        }
    }

    output
}

/// Formats the effective configuration.
#[must_use]
pub fn format_config(config: &OrchestratorConfig, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_config_text(config),
        OutputFormat::Json | OutputFormat::Ndjson => format_json(&ConfigView::from(config)),
    }
}

#[derive(Serialize)]
struct ConfigView {
    max_context_chars: usize,
    top_k: usize,
    target_piece_chars: usize,
    min_pieces: usize,
    max_items_per_piece: u32,
    max_steps_per_piece: u32,
    max_output_tokens_per_piece: u32,
    llm_rate_limit_rpm: u32,
    llm_temperature: f32,
    llm_call_timeout_secs: u64,
    generation_timeout_secs: u64,
}

impl From<&OrchestratorConfig> for ConfigView {
    fn from(c: &OrchestratorConfig) -> Self {
        Self {
            max_context_chars: c.max_context_chars,
            top_k: c.top_k,
            target_piece_chars: c.target_piece_chars,
            min_pieces: c.min_pieces,
            max_items_per_piece: c.max_items_per_piece,
            max_steps_per_piece: c.max_steps_per_piece,
            max_output_tokens_per_piece: c.max_output_tokens_per_piece,
            llm_rate_limit_rpm: c.llm_rate_limit_rpm,
            llm_temperature: c.llm_temperature,
            llm_call_timeout_secs: c.llm_call_timeout_secs,
            generation_timeout_secs: c.generation_timeout_secs,
        }
    }
}

fn format_config_text(config: &OrchestratorConfig) -> String {
    let mut output = String::new();
    output.push_str("Effective configuration\n");
    output.push_str("=======================\n\n");
    let _ = writeln!(output, "  max_context_chars:          {}", config.max_context_chars);
    let _ = writeln!(output, "  top_k:                      {}", config.top_k);
    let _ = writeln!(output, "  target_piece_chars:         {}", config.target_piece_chars);
    let _ = writeln!(output, "  min_pieces:                 {}", config.min_pieces);
    let _ = writeln!(output, "  max_items_per_piece:        {}", config.max_items_per_piece);
    let _ = writeln!(output, "  max_steps_per_piece:        {}", config.max_steps_per_piece);
    let _ = writeln!(
        output,
        "  max_output_tokens_per_piece: {}",
        config.max_output_tokens_per_piece
    );
    let _ = writeln!(output, "  llm_rate_limit_rpm:         {}", config.llm_rate_limit_rpm);
    let _ = writeln!(output, "  llm_temperature:            {}", config.llm_temperature);
    let _ = writeln!(output, "  llm_call_timeout_secs:      {}", config.llm_call_timeout_secs);
    let _ = writeln!(output, "  generation_timeout_secs:    {}", config.generation_timeout_secs);
    output
}

fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an error for output.
///
/// When format is JSON, returns a structured error object. When format is
/// Text, returns the error message string.
#[must_use]
pub fn format_error(error: &crate::Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json | OutputFormat::Ndjson => {
            let json = serde_json::json!({
                "success": false,
                "error": {
                    "message": error.to_string(),
                }
            });
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
        }
    }
}
