//! # rag-orchestrator
//!
//! A retrieval-augmented generation orchestrator for maintenance manuals.
//!
//! Given a set of ingested documents, the orchestrator retrieves the most
//! relevant chunks, assembles a bounded context window, partitions that
//! window into small pieces, drives one LLM sub-request per piece with a
//! role-specific prompt, and merges the per-piece outputs into a single
//! checksheet or set of work instructions.
//!
//! ## Features
//!
//! - **Retrieval**: `SQLite`+FTS5 BM25 and embedding similarity, fused with
//!   reciprocal rank fusion (optional HNSW backend for larger corpora)
//! - **Generation**: rate-limited, retrying `OpenAI`-compatible chat client
//! - **Merging**: tolerant JSON-shape normalization and dedup across pieces

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod cli;
pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod merger;
pub mod orchestrator;
pub mod partition;
pub mod planner;
pub mod progress;
pub mod prompt;
pub mod vector_store;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{
    Artifact, Checksheet, Chunk, ChunkMetadata, ContextPiece, ContextWindow, GenerationMetadata,
    GenerationResult, Item, WorkInstructions,
};

// Re-export configuration
pub use config::OrchestratorConfig;

// Re-export orchestrator types
pub use orchestrator::{CancellationToken, GenerationRequest, Orchestrator};

// Re-export vector store types
pub use vector_store::{DEFAULT_DB_NAME, SqliteVectorStore, VectorStore};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

// Re-export embedding types
#[cfg(feature = "fastembed-embeddings")]
pub use embedding::FastEmbedEmbedder;
pub use embedding::{
    DEFAULT_DIMENSIONS, Embedder, FallbackEmbedder, cosine_similarity, create_embedder,
};

// Re-export LLM adapter types
pub use llm::{LlmClient, OpenAiLlmClient, RateLimiter, RetryPolicy};
