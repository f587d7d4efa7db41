//! Embedded `SQLite` vector store backend.
//!
//! Combines an FTS5 BM25 lexical index with a brute-force cosine-similarity
//! scan over stored embeddings, fused by Reciprocal Rank Fusion when both a
//! query string and an embedder are available. Appropriate for small and
//! medium document sets and for the CLI's local/offline mode.

use crate::core::Chunk;
use crate::embedding::Embedder;
use crate::error::{Result, VectorStoreError};
use crate::vector_store::rrf::{RrfConfig, reciprocal_rank_fusion};
use crate::vector_store::traits::VectorStore;
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use super::schema::{CURRENT_SCHEMA_VERSION, GET_VERSION_SQL, SCHEMA_SQL, SET_VERSION_SQL};

/// Embedded `SQLite`-backed [`VectorStore`].
pub struct SqliteVectorStore {
    conn: StdMutex<Connection>,
    embedder: Arc<dyn Embedder>,
}

impl SqliteVectorStore {
    /// Opens (creating if necessary) a store at `path`, initializing the
    /// schema if it is missing.
    pub fn open(path: &std::path::Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: StdMutex::new(conn),
            embedder,
        })
    }

    /// Opens an in-memory store, primarily for tests.
    pub fn open_in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: StdMutex::new(conn),
            embedder,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)?;
        let version: Option<String> = conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .ok();
        if version.is_none() {
            conn.execute(SET_VERSION_SQL, [CURRENT_SCHEMA_VERSION.to_string()])?;
        }
        Ok(())
    }

    fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
        blob.chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    /// Escapes an FTS5 MATCH query by quoting each term and joining with OR,
    /// so punctuation in retrieved text can't break the query syntax.
    fn build_fts_query(text: &str) -> String {
        text.split_whitespace()
            .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    fn search_bm25(
        conn: &Connection,
        query_text: &str,
        document_ids: &[String],
        limit: usize,
    ) -> Result<Vec<i64>> {
        if query_text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let fts_query = Self::build_fts_query(query_text);
        let placeholders = document_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT c.id FROM chunks c \
             JOIN chunks_fts f ON f.rowid = c.id \
             WHERE chunks_fts MATCH ?1 AND c.file_id IN ({placeholders}) \
             ORDER BY bm25(chunks_fts) LIMIT ?{}",
            document_ids.len() + 2
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(fts_query)];
        for id in document_ids {
            params.push(Box::new(id.clone()));
        }
        params.push(Box::new(limit as i64));
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
        let ids = stmt
            .query_map(param_refs.as_slice(), |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn search_semantic(
        conn: &Connection,
        query_embedding: &[f32],
        document_ids: &[String],
        limit: usize,
    ) -> Result<Vec<i64>> {
        let placeholders = document_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT c.id, e.embedding FROM chunks c \
             JOIN chunk_embeddings e ON e.chunk_id = c.id \
             WHERE c.file_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            document_ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            let id: i64 = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((id, blob))
        })?;

        let mut scored: Vec<(i64, f32)> = Vec::new();
        for row in rows {
            let (id, blob) = row?;
            let embedding = Self::blob_to_embedding(&blob);
            let score = crate::embedding::cosine_similarity(query_embedding, &embedding);
            scored.push((id, score));
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(id, _)| id).collect())
    }

    fn load_chunk(conn: &Connection, id: i64) -> Result<Chunk> {
        conn.query_row(
            "SELECT c.file_id, d.file_name, c.chunk_index, c.content, c.page_number, \
                    c.page_range, c.display_page_number \
             FROM chunks c JOIN documents d ON d.file_id = c.file_id WHERE c.id = ?1",
            [id],
            |row| {
                let file_id: String = row.get(0)?;
                let file_name: String = row.get(1)?;
                let chunk_index: i64 = row.get(2)?;
                let content: String = row.get(3)?;
                let page_number: Option<u32> = row.get(4)?;
                let page_range: Option<String> = row.get(5)?;
                let display_page_number: Option<u32> = row.get(6)?;

                let mut chunk = Chunk::new(id, file_id, content, chunk_index as usize)
                    .with_file_name(file_name);
                chunk.metadata.page_number = page_number;
                chunk.metadata.page_range = page_range;
                chunk.metadata.display_page_number = display_page_number;
                Ok(chunk)
            },
        )
        .map_err(|e| VectorStoreError::Database(e.to_string()).into())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn query_by_document_ids(
        &self,
        document_ids: &[String],
        query_text: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<Chunk>> {
        if document_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| VectorStoreError::Database(e.to_string()))?;

        let ranked_ids: Vec<i64> = match query_text.filter(|q| !q.trim().is_empty()) {
            Some(text) => {
                let query_embedding = self
                    .embedder
                    .embed(text)
                    .map_err(|e| VectorStoreError::Embedding(e.to_string()))?;
                let semantic = Self::search_semantic(&conn, &query_embedding, document_ids, top_k * 4)?;
                let bm25 = Self::search_bm25(&conn, text, document_ids, top_k * 4)?;
                if bm25.is_empty() {
                    semantic
                } else {
                    let fused = reciprocal_rank_fusion(&[&semantic, &bm25], &RrfConfig::default());
                    fused.into_iter().map(|(id, _)| id).collect()
                }
            }
            None => {
                let placeholders =
                    document_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
                let sql = format!(
                    "SELECT id FROM chunks WHERE file_id IN ({placeholders}) ORDER BY chunk_index"
                );
                let mut stmt = conn.prepare(&sql)?;
                let param_refs: Vec<&dyn rusqlite::ToSql> =
                    document_ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
                stmt.query_map(param_refs.as_slice(), |row| row.get::<_, i64>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        ranked_ids
            .into_iter()
            .take(top_k)
            .map(|id| Self::load_chunk(&conn, id))
            .collect()
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

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| VectorStoreError::Database(e.to_string()))?;
        let tx = conn.transaction()?;
        let now = current_timestamp();

        tx.execute(
            "INSERT OR IGNORE INTO documents (file_id, file_name, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![file_id, file_name, now],
        )?;

        for (index, ((text, page_number), embedding)) in
            chunks.into_iter().zip(embeddings).enumerate()
        {
            tx.execute(
                "INSERT INTO chunks (file_id, chunk_index, content, page_number, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![file_id, index as i64, text, page_number, now],
            )?;
            let chunk_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO chunk_embeddings (chunk_id, embedding, dimensions) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    chunk_id,
                    Self::embedding_to_blob(&embedding),
                    embedding.len() as i64
                ],
            )?;
        }

        let count = tx.query_row(
            "SELECT COUNT(*) FROM chunks WHERE file_id = ?1",
            [file_id],
            |row| row.get::<_, i64>(0),
        )?;
        tx.commit()?;
        Ok(count as usize)
    }
}

#[allow(clippy::cast_possible_wrap)]
fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
