//! Orchestrator configuration surface (§6).
//!
//! Every field has a named default and is overridable by an environment
//! variable of the same name, following the teacher crate's
//! `clap(env = "...")` convention on the CLI side.

use clap::Args;

/// Tunable limits and knobs for a generation run.
#[derive(Debug, Clone, Copy, Args)]
pub struct OrchestratorConfig {
    /// Maximum length, in bytes, of the assembled context window.
    #[arg(long, env = "RAG_MAX_CONTEXT_CHARS", default_value_t = 4000)]
    pub max_context_chars: usize,

    /// Number of chunks requested from the vector store.
    #[arg(long, env = "RAG_TOP_K", default_value_t = 10)]
    pub top_k: usize,

    /// Target size, in bytes, of a single context piece.
    #[arg(long, env = "RAG_TARGET_PIECE_CHARS", default_value_t = 300)]
    pub target_piece_chars: usize,

    /// Minimum number of pieces regardless of context size.
    #[arg(long, env = "RAG_MIN_PIECES", default_value_t = 15)]
    pub min_pieces: usize,

    /// Maximum checksheet items a single sub-request may return.
    #[arg(long, env = "RAG_MAX_ITEMS_PER_PIECE", default_value_t = 8)]
    pub max_items_per_piece: u32,

    /// Maximum work-instruction steps a single sub-request may return.
    #[arg(long, env = "RAG_MAX_STEPS_PER_PIECE", default_value_t = 2)]
    pub max_steps_per_piece: u32,

    /// Output-token cap applied to every LLM sub-request.
    #[arg(long, env = "RAG_MAX_OUTPUT_TOKENS_PER_PIECE", default_value_t = 8000)]
    pub max_output_tokens_per_piece: u32,

    /// Requests-per-minute cap enforced by the LLM adapter's rate limiter.
    #[arg(long, env = "RAG_LLM_RATE_LIMIT_RPM", default_value_t = 50)]
    pub llm_rate_limit_rpm: u32,

    /// Sampling temperature for every LLM sub-request.
    #[arg(long, env = "RAG_LLM_TEMPERATURE", default_value_t = 0.3)]
    pub llm_temperature: f32,

    /// Per-call timeout, in seconds, for a single LLM round-trip.
    #[arg(long, env = "RAG_LLM_CALL_TIMEOUT_SECS", default_value_t = 60)]
    pub llm_call_timeout_secs: u64,

    /// Overall deadline, in seconds, for one generation end-to-end.
    #[arg(long, env = "RAG_GENERATION_TIMEOUT_SECS", default_value_t = 300)]
    pub generation_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 4000,
            top_k: 10,
            target_piece_chars: 300,
            min_pieces: 15,
            max_items_per_piece: 8,
            max_steps_per_piece: 2,
            max_output_tokens_per_piece: 8000,
            llm_rate_limit_rpm: 50,
            llm_temperature: 0.3,
            llm_call_timeout_secs: 60,
            generation_timeout_secs: 300,
        }
    }
}

impl OrchestratorConfig {
    /// Computes the number of pieces to cut a context window of `window_len`
    /// bytes into, per §4.3: `max(minPieces, ceil(windowLen/targetPieceChars))`.
    #[must_use]
    pub fn piece_count(&self, window_len: usize) -> usize {
        if window_len == 0 {
            return self.min_pieces;
        }
        let by_size = window_len.div_ceil(self.target_piece_chars);
        self.min_pieces.max(by_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_context_chars, 4000);
        assert_eq!(config.top_k, 10);
        assert_eq!(config.target_piece_chars, 300);
        assert_eq!(config.min_pieces, 15);
        assert_eq!(config.max_items_per_piece, 8);
        assert_eq!(config.max_steps_per_piece, 2);
        assert_eq!(config.max_output_tokens_per_piece, 8000);
        assert_eq!(config.llm_rate_limit_rpm, 50);
        assert!((config.llm_temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_piece_count_floors_at_min_pieces() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.piece_count(1200), 15);
    }

    #[test]
    fn test_piece_count_scales_with_window_size() {
        let config = OrchestratorConfig {
            min_pieces: 1,
            target_piece_chars: 300,
            ..Default::default()
        };
        assert_eq!(config.piece_count(900), 3);
        assert_eq!(config.piece_count(901), 4);
    }

    #[test]
    fn test_piece_count_empty_window() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.piece_count(0), config.min_pieces);
    }
}
