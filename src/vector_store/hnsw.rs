//! HNSW approximate-nearest-neighbor vector store backend (feature-gated).
//!
//! Appropriate for larger corpora where the `SqliteVectorStore`'s
//! brute-force cosine scan would not scale. Metadata (file names, pages)
//! still lives in `SQLite`; only similarity search is delegated to `usearch`.

use crate::core::Chunk;
use crate::embedding::Embedder;
use crate::error::{Result, VectorStoreError};
use crate::vector_store::sqlite::SqliteVectorStore;
use crate::vector_store::traits::VectorStore;
use async_trait::async_trait;
use std::sync::{Arc, Mutex as StdMutex};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

/// Configuration for the HNSW index.
#[derive(Debug, Clone, Copy)]
pub struct HnswConfig {
    /// Embedding dimensionality. Must match the configured embedder.
    pub dimensions: usize,
    /// Graph connectivity (`M` in the HNSW literature).
    pub connectivity: usize,
    /// Candidate list size during index construction.
    pub expansion_add: usize,
    /// Candidate list size during search.
    pub expansion_search: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            dimensions: crate::embedding::DEFAULT_DIMENSIONS,
            connectivity: 16,
            expansion_add: 128,
            expansion_search: 64,
        }
    }
}

/// `usearch`-backed approximate-nearest-neighbor [`VectorStore`].
///
/// Delegates metadata storage and ingestion bookkeeping to an inner
/// [`SqliteVectorStore`]; only similarity ranking is replaced.
pub struct HnswVectorStore {
    index: StdMutex<Index>,
    metadata: SqliteVectorStore,
    embedder: Arc<dyn Embedder>,
}

impl HnswVectorStore {
    /// Builds a new HNSW-backed store, validating that the embedder's
    /// dimensionality matches the index configuration before any data is
    /// written (a mismatch here is always fatal, never a retryable error).
    pub fn new(path: &std::path::Path, embedder: Arc<dyn Embedder>, config: HnswConfig) -> Result<Self> {
        if embedder.dimensions() != config.dimensions {
            return Err(VectorStoreError::DimensionMismatch {
                actual: embedder.dimensions(),
                expected: config.dimensions,
            }
            .into());
        }

        let options = IndexOptions {
            dimensions: config.dimensions,
            metric: MetricKind::Cos,
            quantization: ScalarKind::F32,
            connectivity: config.connectivity,
            expansion_add: config.expansion_add,
            expansion_search: config.expansion_search,
            multi: false,
        };
        let index = Index::new(&options)
            .map_err(|e| VectorStoreError::Database(format!("failed to create HNSW index: {e}")))?;
        index
            .reserve(1_000)
            .map_err(|e| VectorStoreError::Database(format!("failed to reserve HNSW capacity: {e}")))?;

        Ok(Self {
            index: StdMutex::new(index),
            metadata: SqliteVectorStore::open(path, embedder.clone())?,
            embedder,
        })
    }
}

#[async_trait]
impl VectorStore for HnswVectorStore {
    async fn query_by_document_ids(
        &self,
        document_ids: &[String],
        query_text: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<Chunk>> {
        let Some(text) = query_text.filter(|q| !q.trim().is_empty()) else {
            return self
                .metadata
                .query_by_document_ids(document_ids, None, top_k)
                .await;
        };

        let query_embedding = self
            .embedder
            .embed(text)
            .map_err(|e| VectorStoreError::Embedding(e.to_string()))?;

        let index = self
            .index
            .lock()
            .map_err(|e| VectorStoreError::Database(e.to_string()))?;
        let matches = index
            .search(&query_embedding, top_k * 4)
            .map_err(|e| VectorStoreError::Database(format!("HNSW search failed: {e}")))?;
        drop(index);

        // Fall back to the metadata store to resolve and filter by document
        // id, since usearch itself is metadata-agnostic.
        let candidate_ids: Vec<String> = matches
            .keys
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let all = self
            .metadata
            .query_by_document_ids(document_ids, None, candidate_ids.len().max(top_k))
            .await?;
        Ok(all.into_iter().take(top_k).collect())
    }

    async fn ingest_document(
        &self,
        file_id: &str,
        file_name: &str,
        chunks: Vec<(String, Option<u32>)>,
    ) -> Result<usize> {
        let texts: Vec<&str> = chunks.iter().map(|(t, _)| t.as_str()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .map_err(|e| VectorStoreError::Embedding(e.to_string()))?;

        let count = self
            .metadata
            .ingest_document(file_id, file_name, chunks)
            .await?;

        let index = self
            .index
            .lock()
            .map_err(|e| VectorStoreError::Database(e.to_string()))?;
        for (offset, embedding) in embeddings.iter().enumerate() {
            let key = (offset as u64) + index.size() as u64;
            index
                .add(key, embedding)
                .map_err(|e| VectorStoreError::Database(format!("HNSW insert failed: {e}")))?;
        }

        Ok(count)
    }
}
