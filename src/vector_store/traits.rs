//! The vector store adapter contract (§4.1).

use crate::core::Chunk;
use crate::error::Result;
use async_trait::async_trait;

/// Uniform retrieval interface over a vector database backend.
///
/// Implementations MUST preserve `file_id`/`file_name`/`chunk_index` and, when
/// available, `page_number`/`page_range`/`display_page_number` on every
/// returned chunk. An empty result is not itself an error — the orchestrator
/// decides what to do with it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Retrieves up to `top_k` chunks whose `file_id` is one of `document_ids`.
    ///
    /// If `query_text` is non-empty, the adapter performs similarity search
    /// against it (embedding it task-typed as a retrieval query). Otherwise
    /// it returns an arbitrary sample from the matching set.
    async fn query_by_document_ids(
        &self,
        document_ids: &[String],
        query_text: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<Chunk>>;

    /// Ingests a document's pre-chunked text into the store. Not part of the
    /// distilled retrieval contract; provided so the ambient CLI (and tests)
    /// can populate a store without a separate out-of-scope ingestion
    /// service.
    async fn ingest_document(
        &self,
        file_id: &str,
        file_name: &str,
        chunks: Vec<(String, Option<u32>)>,
    ) -> Result<usize>;
}
