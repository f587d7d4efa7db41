//! Vector store adapter: the retrieval half of the orchestrator (§4.1).
//!
//! Two backends share the [`VectorStore`] trait: an embedded `SQLite` store
//! (default) and an HNSW approximate-nearest-neighbor index (feature-gated
//! `hnsw-search`, for larger corpora).

pub mod rrf;
pub mod schema;
pub mod sqlite;
pub mod traits;

#[cfg(feature = "hnsw-search")]
pub mod hnsw;

pub use rrf::{RrfConfig, reciprocal_rank_fusion};
pub use sqlite::SqliteVectorStore;
pub use traits::VectorStore;

#[cfg(feature = "hnsw-search")]
pub use hnsw::{HnswConfig, HnswVectorStore};

/// Default `SQLite` vector store file name.
pub const DEFAULT_DB_NAME: &str = "rag-orchestrator.db";
