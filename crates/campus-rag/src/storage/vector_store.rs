//! SQLite-backed vector store
//!
//! Chunks and their embeddings live in a single table, scoped to a named
//! collection. Search is brute-force cosine similarity over the
//! collection, which holds up well at the scale of a campus document set.
//! Embeddings are stored as little-endian f32 blobs.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, ScoredChunk};

/// SQLite-backed store for chunks and embeddings
#[derive(Clone)]
pub struct VectorStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
}

impl VectorStore {
    /// Create or open a store at the given path
    pub fn open<P: AsRef<Path>>(path: P, collection: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::vector_db(format!("Failed to open database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
        };

        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    #[cfg(test)]
    pub fn in_memory(collection: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::vector_db(format!("Failed to open in-memory database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
        };

        store.migrate()?;
        Ok(store)
    }

    /// Name of the collection this store reads and writes
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#,
        )
        .map_err(|e| Error::vector_db(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL,
                page INTEGER,
                ingested_at TEXT NOT NULL,
                embedding BLOB NOT NULL,
                dims INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection);
        "#,
        )
        .map_err(|e| Error::vector_db(format!("Failed to run migrations: {}", e)))?;

        Ok(())
    }

    /// Add chunks with their embeddings
    ///
    /// Duplicate content is written again with a fresh id; callers that
    /// want deduplication must do it before ingesting.
    pub async fn add(&self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_db(format!(
                "Chunk/embedding count mismatch: {} vs {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let store = self.clone();
        run_blocking(move || store.add_sync(&chunks, &embeddings)).await
    }

    /// Query the collection for the chunks most similar to an embedding
    ///
    /// Returns at most `top_k` results in descending similarity order.
    pub async fn query(&self, embedding: Vec<f32>, top_k: usize) -> Result<Vec<ScoredChunk>> {
        let store = self.clone();
        run_blocking(move || store.query_sync(&embedding, top_k)).await
    }

    /// Delete every chunk in the collection. Idempotent.
    pub async fn delete_all(&self) -> Result<usize> {
        let store = self.clone();
        run_blocking(move || store.delete_all_sync()).await
    }

    /// Number of chunks in the collection
    pub async fn count(&self) -> Result<usize> {
        let store = self.clone();
        run_blocking(move || store.count_sync()).await
    }

    fn add_sync(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::vector_db(format!("Failed to start transaction: {}", e)))?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            tx.execute(
                "INSERT INTO chunks (id, collection, content, source, page, ingested_at, embedding, dims)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    chunk.id.to_string(),
                    self.collection,
                    chunk.content,
                    chunk.source.to_string_lossy(),
                    chunk.page,
                    chunk.ingested_at,
                    serialize_embedding(embedding),
                    embedding.len() as i64,
                ],
            )
            .map_err(|e| Error::vector_db(format!("Failed to insert chunk: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| Error::vector_db(format!("Failed to commit: {}", e)))?;

        Ok(chunks.len())
    }

    fn query_sync(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, content, source, page, ingested_at, embedding
                 FROM chunks WHERE collection = ?1",
            )
            .map_err(|e| Error::vector_db(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![self.collection], |row| {
                let id: String = row.get(0)?;
                let content: String = row.get(1)?;
                let source: String = row.get(2)?;
                let page: Option<u32> = row.get(3)?;
                let ingested_at: DateTime<Utc> = row.get(4)?;
                let blob: Vec<u8> = row.get(5)?;
                Ok((id, content, source, page, ingested_at, blob))
            })
            .map_err(|e| Error::vector_db(format!("Query failed: {}", e)))?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, content, source, page, ingested_at, blob) =
                row.map_err(|e| Error::vector_db(format!("Failed to read row: {}", e)))?;

            let id = Uuid::parse_str(&id)
                .map_err(|e| Error::vector_db(format!("Corrupt chunk id '{}': {}", id, e)))?;
            let stored = deserialize_embedding(&blob);
            let score = cosine_similarity(embedding, &stored);

            scored.push(ScoredChunk {
                chunk: Chunk {
                    id,
                    content,
                    source: source.into(),
                    page,
                    ingested_at,
                },
                score,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    fn delete_all_sync(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = conn
            .execute(
                "DELETE FROM chunks WHERE collection = ?1",
                params![self.collection],
            )
            .map_err(|e| Error::vector_db(format!("Failed to delete collection: {}", e)))?;
        Ok(deleted)
    }

    fn count_sync(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
                params![self.collection],
                |row| row.get(0),
            )
            .map_err(|e| Error::vector_db(format!("Failed to count chunks: {}", e)))?;
        Ok(count as usize)
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::vector_db(format!("Store task failed: {}", e)))?
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity, 0.0 for mismatched or zero-norm vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}
