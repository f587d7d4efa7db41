//! Error types for the RAG orchestrator.
//!
//! This module provides a comprehensive error hierarchy using `thiserror` for
//! every component of the generation pipeline: vector retrieval, LLM calls,
//! context partitioning, prompt resolution, and artifact merging.

use thiserror::Error;

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for orchestrator operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Vector store-related errors (retrieval).
    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    /// LLM adapter errors (generation).
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Context partitioning errors.
    #[error("partition error: {0}")]
    Partition(#[from] PartitionError),

    /// Prompt library errors.
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Artifact merge errors.
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    /// Caller-supplied input failed validation.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the invalid input.
        message: String,
    },

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Generic I/O error (reading local files for the ambient CLI).
    #[error("I/O error: {0}")]
    Io(String),

    /// A sub-request failure, wrapped with the piece index/count it occurred
    /// at (§7's propagation rule).
    #[error("failed to generate chunk {} of {total}: {source}", index + 1)]
    Piece {
        /// Zero-based index of the failing piece.
        index: usize,
        /// Total number of pieces in this generation.
        total: usize,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Constructs an [`Error::InvalidInput`] with the given message.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Wraps this error with the piece index/count it occurred at.
    #[must_use]
    pub fn context_piece(self, index: usize, total: usize) -> Self {
        Self::Piece {
            index,
            total,
            source: Box::new(self),
        }
    }
}

/// Vector store-specific errors.
#[derive(Error, Debug)]
pub enum VectorStoreError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Store not initialized (schema missing).
    #[error("vector store not initialized; run `rag-orchestrator ingest` first")]
    NotInitialized,

    /// Retrieval returned no chunks for the requested document set.
    #[error("no chunks found for document ids {document_ids:?}")]
    NoDocumentsIngested {
        /// The document ids that were requested.
        document_ids: Vec<String>,
    },

    /// Embedder and index were built with incompatible dimensions.
    #[error("embedding dimension mismatch: embedder produces {actual}, index expects {expected}")]
    DimensionMismatch {
        /// Dimensions produced by the configured embedder.
        actual: usize,
        /// Dimensions expected by the index.
        expected: usize,
    },

    /// A feature-gated backend was requested but not compiled in.
    #[error("backend requires the `{feature}` feature, which is not enabled")]
    FeatureNotEnabled {
        /// Name of the missing cargo feature.
        feature: String,
    },

    /// Serialization/deserialization error (embedding BLOB, metadata JSON).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Embedding generation failed.
    #[error("embedding error: {0}")]
    Embedding(String),
}

/// LLM adapter-specific errors.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The LLM stopped generating because it hit the output-token cap.
    #[error("response truncated at {max_output_tokens} output tokens (consumed {consumed} total)")]
    Truncated {
        /// The configured output-token cap for the call.
        max_output_tokens: u32,
        /// Total tokens consumed by the call (prompt + candidate).
        consumed: u32,
    },

    /// The LLM refused to generate due to a safety/content policy filter.
    #[error("response blocked by safety filter: {reason}")]
    SafetyBlocked {
        /// Provider-reported reason, if any.
        reason: String,
    },

    /// A transient failure: rate limiting, 5xx, network error, or empty candidates.
    /// Retryable by the adapter's backoff loop.
    #[error("transient LLM failure: {0}")]
    Transient(String),

    /// The LLM's text output could not be parsed as JSON even after fence
    /// stripping and boundary isolation.
    #[error("could not extract valid JSON from LLM output: {0}")]
    InvalidJson(String),

    /// Authentication or malformed-request error. Not retryable.
    #[error("LLM request rejected: {0}")]
    RequestRejected(String),

    /// Retry budget was exhausted for a transient failure.
    #[error("exhausted {attempts} retry attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The last transient error observed.
        last_error: String,
    },
}

impl LlmError {
    /// Whether this error kind should be retried by the adapter's backoff loop.
    ///
    /// Truncation and invalid JSON are excluded deliberately: repeating the
    /// same prompt against the same piece produces the same failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Context-partitioning errors.
#[derive(Error, Debug)]
pub enum PartitionError {
    /// The context window to partition was empty or whitespace-only.
    #[error("context is empty; nothing to partition")]
    EmptyContext,

    /// The position map is inconsistent with the context window it describes.
    #[error("position map entry [{start}, {end}) does not align with window of length {window_len}")]
    InconsistentPositionMap {
        /// Start offset of the offending entry.
        start: usize,
        /// End offset of the offending entry.
        end: usize,
        /// Length of the context window.
        window_len: usize,
    },
}

/// Prompt library errors.
#[derive(Error, Debug)]
pub enum PromptError {
    /// Requested use case has no registered prompt and no built-in default.
    #[error("no prompt registered for use case: {use_case}")]
    UnknownUseCase {
        /// The requested use case identifier.
        use_case: String,
    },

    /// Template is missing the mandatory `{context}` placeholder.
    #[error("prompt template for {use_case} is missing the {{context}} placeholder")]
    MissingContextPlaceholder {
        /// The use case whose template is malformed.
        use_case: String,
    },

    /// The library's override map lock was poisoned by a panicking holder.
    #[error("prompt library lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Artifact-merge errors.
#[derive(Error, Debug)]
pub enum MergeError {
    /// After merging every piece, the resulting artifact has no content.
    #[error("merged artifact is empty after processing {pieces_processed} piece(s)")]
    MergeEmpty {
        /// Number of pieces that were processed before the check.
        pieces_processed: usize,
    },

    /// A sub-request's JSON output didn't conform to the expected shape
    /// (neither a bare array nor a recognized wrapper object).
    #[error("unrecognized JSON shape for piece {piece_index}: {description}")]
    UnrecognizedShape {
        /// Index of the piece whose output could not be normalized.
        piece_index: usize,
        /// Human-readable description of what was found instead.
        description: String,
    },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::VectorStore(VectorStoreError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for VectorStoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for VectorStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
