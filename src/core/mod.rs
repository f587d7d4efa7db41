//! Core domain models for the RAG orchestrator.
//!
//! Pure data types with no I/O dependencies: chunks returned by the vector
//! store, the bounded context window they're assembled into, the small
//! pieces that window is partitioned into, and the structured artifacts a
//! generation produces.

pub mod artifact;
pub mod chunk;
pub mod piece;
pub mod window;

pub use artifact::{
    Artifact, AttributedEntry, Checksheet, Frequency, GenerationMetadata, GenerationResult, Item,
    Prerequisites, Step, WorkInstructions,
};
pub use chunk::{Chunk, ChunkMetadata, find_char_boundary};
pub use piece::{ContextPiece, Source};
pub use window::{ChunkPositionMap, ContextWindow, PositionMapEntry};
