//! The `rusqlite`-backed document store.
//!
//! Reads and writes go through `spawn_blocking` around a single shared
//! connection guarded by a `std::sync::Mutex` — single-writer /
//! many-readers discipline is enforced by that one lock rather than by
//! database-level locking, since SQLite itself serializes writers per
//! file anyway.

use crate::{
    chunker::chunk_text,
    embedder::{cosine_similarity, Embedder},
    error::RagError,
    types::{ChunkMatch, DatasetInfo, Document, Priority, QueryFilters},
};
use kernel_core::Dataset;
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::instrument;

const DOCUMENT_ID_PREFIX_BYTES: usize = 256;

/// The document store: chunking + embeddings + similarity search over
/// a fixed dataset taxonomy, backed by an embedded relational database.
pub struct RagStore {
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn Embedder>,
}

fn init_schema(conn: &Connection) -> Result<(), RagError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            dataset TEXT NOT NULL,
            filename TEXT NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT NOT NULL,
            version INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS document_versions (
            document_id TEXT NOT NULL,
            version INTEGER NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (document_id, version)
        );
        CREATE TABLE IF NOT EXISTS chunks (
            document_id TEXT NOT NULL,
            order_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            PRIMARY KEY (document_id, order_index)
        );
        CREATE INDEX IF NOT EXISTS idx_documents_dataset ON documents(dataset);
        CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id);
        ",
    )?;
    Ok(())
}

fn document_id(dataset: Dataset, filename: &str, content: &str) -> String {
    let prefix: String = content.chars().take(DOCUMENT_ID_PREFIX_BYTES).collect();
    let mut hasher = Sha256::new();
    hasher.update(dataset.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(filename.as_bytes());
    hasher.update(b"\0");
    hasher.update(prefix.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn pack_embedding(v: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len() * 4);
    for f in v {
        out.extend_from_slice(&f.to_le_bytes());
    }
    out
}

fn unpack_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl RagStore {
    /// Open (creating if absent) a store backed by a file at `path`.
    pub fn open(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, RagError> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder,
        })
    }

    /// Open an ephemeral in-memory store, for tests.
    pub fn open_in_memory(embedder: Arc<dyn Embedder>) -> Result<Self, RagError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder,
        })
    }

    /// Ingest a document. Idempotent:
    /// re-ingesting identical `(dataset, filename, content)` archives
    /// the previous row as a [`DocumentVersion`] and leaves the
    /// document id unchanged.
    #[instrument(skip(self, content, metadata))]
    pub async fn add_document(
        &self,
        dataset_tag: &str,
        filename: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<String, RagError> {
        let dataset = Dataset::canonicalize(dataset_tag);
        let doc_id = document_id(dataset, filename, content);

        let pieces = chunk_text(content);
        let refs: Vec<&str> = pieces.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&refs).await?;
        let packed: Vec<Vec<u8>> = embeddings.iter().map(|e| pack_embedding(e)).collect();

        let conn = self.conn.clone();
        let filename = filename.to_string();
        let content = content.to_string();
        let metadata_json = metadata.to_string();
        let now = now_millis();
        let doc_id_for_task = doc_id.clone();

        tokio::task::spawn_blocking(move || -> Result<(), RagError> {
            let mut guard = conn.lock().expect("rag db mutex poisoned");
            let tx = guard.transaction()?;

            let existing: Option<(u32, String, String)> = tx
                .query_row(
                    "SELECT version, content, metadata FROM documents WHERE id = ?1",
                    params![doc_id_for_task],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
                )
                .ok();

            let new_version = if let Some((prev_version, prev_content, prev_metadata)) = existing {
                tx.execute(
                    "INSERT INTO document_versions (document_id, version, content, metadata, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![doc_id_for_task, prev_version, prev_content, prev_metadata, now],
                )?;
                tx.execute(
                    "UPDATE documents SET filename=?2, content=?3, metadata=?4, version=?5, updated_at=?6 WHERE id=?1",
                    params![doc_id_for_task, filename, content, metadata_json, prev_version + 1, now],
                )?;
                prev_version + 1
            } else {
                tx.execute(
                    "INSERT INTO documents (id, dataset, filename, content, metadata, version, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
                    params![doc_id_for_task, dataset.as_str(), filename, content, metadata_json, now],
                )?;
                1
            };
            let _ = new_version;

            tx.execute("DELETE FROM chunks WHERE document_id = ?1", params![doc_id_for_task])?;
            for (i, (text, embedding)) in pieces.iter().zip(packed.iter()).enumerate() {
                tx.execute(
                    "INSERT INTO chunks (document_id, order_index, text, embedding) VALUES (?1, ?2, ?3, ?4)",
                    params![doc_id_for_task, i as i64, text, embedding],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|e| RagError::Storage(e.to_string()))??;

        Ok(doc_id)
    }

    /// Similarity search over one dataset's chunks.
    #[instrument(skip(self, filters))]
    pub async fn query(
        &self,
        dataset_tag: &str,
        text: &str,
        top_k: usize,
        filters: QueryFilters,
    ) -> Result<Vec<ChunkMatch>, RagError> {
        let dataset = Dataset::canonicalize(dataset_tag);
        let query_embedding = self.embedder.embed_one(text).await?;

        let conn = self.conn.clone();
        let dataset_str = dataset.as_str().to_string();
        tokio::task::spawn_blocking(move || -> Result<Vec<ChunkMatch>, RagError> {
            let guard = conn.lock().expect("rag db mutex poisoned");
            let mut stmt = guard.prepare(
                "SELECT c.document_id, c.order_index, c.text, c.embedding, d.filename, d.metadata
                 FROM chunks c JOIN documents d ON d.id = c.document_id
                 WHERE d.dataset = ?1",
            )?;
            let rows = stmt.query_map(params![dataset_str], |r| {
                let document_id: String = r.get(0)?;
                let order_index: i64 = r.get(1)?;
                let text: String = r.get(2)?;
                let embedding: Vec<u8> = r.get(3)?;
                let filename: String = r.get(4)?;
                let metadata: String = r.get(5)?;
                Ok((document_id, order_index, text, embedding, filename, metadata))
            })?;

            let mut matches = Vec::new();
            for row in rows {
                let (document_id, order_index, chunk_text, embedding, filename, metadata_str) = row?;
                let metadata: serde_json::Value =
                    serde_json::from_str(&metadata_str).unwrap_or(serde_json::Value::Null);

                if let Some(wanted_type) = &filters.doc_type {
                    let actual = metadata.get("type").and_then(|v| v.as_str()).unwrap_or("");
                    if actual != wanted_type {
                        continue;
                    }
                }
                if let Some(min_priority) = filters.min_priority {
                    let actual = metadata
                        .get("priority")
                        .and_then(|v| v.as_str())
                        .and_then(Priority::parse);
                    if actual.map(|p| p < min_priority).unwrap_or(true) {
                        continue;
                    }
                }

                let sim = cosine_similarity(&query_embedding, &unpack_embedding(&embedding)).max(0.0);
                matches.push(ChunkMatch {
                    document_id,
                    order_index: order_index as u32,
                    text: chunk_text,
                    filename,
                    metadata,
                    similarity: sim,
                });
            }

            matches.sort_by(|a, b| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.document_id.cmp(&b.document_id))
                    .then_with(|| a.order_index.cmp(&b.order_index))
            });
            matches.truncate(top_k);
            Ok(matches)
        })
        .await
        .map_err(|e| RagError::Storage(e.to_string()))?
    }

    /// List every document in a dataset.
    pub async fn list_documents(&self, dataset_tag: &str) -> Result<Vec<Document>, RagError> {
        let dataset = Dataset::canonicalize(dataset_tag);
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Document>, RagError> {
            let guard = conn.lock().expect("rag db mutex poisoned");
            let mut stmt = guard.prepare(
                "SELECT id, dataset, filename, content, metadata, version, created_at, updated_at
                 FROM documents WHERE dataset = ?1",
            )?;
            let rows = stmt.query_map(params![dataset.as_str()], row_to_document)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(RagError::from)
        })
        .await
        .map_err(|e| RagError::Storage(e.to_string()))?
    }

    /// Every dataset with at least one document, plus the fixed-but-empty ones.
    pub async fn list_datasets(&self) -> Result<Vec<DatasetInfo>, RagError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<DatasetInfo>, RagError> {
            let guard = conn.lock().expect("rag db mutex poisoned");
            let datasets = [
                Dataset::AgentCore,
                Dataset::ContextFlow,
                Dataset::AgentMemory,
                Dataset::Projects,
                Dataset::Scratchpad,
            ];
            let mut out = Vec::with_capacity(datasets.len());
            for dataset in datasets {
                let document_count: u64 = guard.query_row(
                    "SELECT COUNT(*) FROM documents WHERE dataset = ?1",
                    params![dataset.as_str()],
                    |r| r.get(0),
                )?;
                let chunk_count: u64 = guard.query_row(
                    "SELECT COUNT(*) FROM chunks c JOIN documents d ON d.id = c.document_id WHERE d.dataset = ?1",
                    params![dataset.as_str()],
                    |r| r.get(0),
                )?;
                out.push(DatasetInfo {
                    dataset,
                    document_count,
                    chunk_count,
                });
            }
            Ok(out)
        })
        .await
        .map_err(|e| RagError::Storage(e.to_string()))?
    }

    /// Delete one document and cascade-delete its chunks. `DocumentVersion`
    /// rows are retained (they're only removed by `delete_dataset`).
    pub async fn delete_document(&self, document_id: &str) -> Result<(), RagError> {
        let conn = self.conn.clone();
        let document_id = document_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), RagError> {
            let guard = conn.lock().expect("rag db mutex poisoned");
            let affected = guard.execute("DELETE FROM documents WHERE id = ?1", params![document_id])?;
            if affected == 0 {
                return Err(RagError::DocumentNotFound(document_id));
            }
            guard.execute("DELETE FROM chunks WHERE document_id = ?1", params![document_id])?;
            Ok(())
        })
        .await
        .map_err(|e| RagError::Storage(e.to_string()))?
    }

    /// Delete every document, chunk, and version in a dataset.
    pub async fn delete_dataset(&self, dataset_tag: &str) -> Result<u64, RagError> {
        let dataset = Dataset::canonicalize(dataset_tag);
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<u64, RagError> {
            let guard = conn.lock().expect("rag db mutex poisoned");
            let ids: Vec<String> = {
                let mut stmt = guard.prepare("SELECT id FROM documents WHERE dataset = ?1")?;
                let rows = stmt.query_map(params![dataset.as_str()], |r| r.get(0))?;
                rows.collect::<Result<_, _>>()?
            };
            for id in &ids {
                guard.execute("DELETE FROM chunks WHERE document_id = ?1", params![id])?;
                guard.execute("DELETE FROM document_versions WHERE document_id = ?1", params![id])?;
            }
            guard.execute("DELETE FROM documents WHERE dataset = ?1", params![dataset.as_str()])?;
            Ok(ids.len() as u64)
        })
        .await
        .map_err(|e| RagError::Storage(e.to_string()))?
    }

    /// Per-dataset document/chunk counts.
    pub async fn get_dataset_info(&self, dataset_tag: &str) -> Result<DatasetInfo, RagError> {
        let dataset = Dataset::canonicalize(dataset_tag);
        let all = self.list_datasets().await?;
        Ok(all
            .into_iter()
            .find(|d| d.dataset == dataset)
            .unwrap_or(DatasetInfo {
                dataset,
                document_count: 0,
                chunk_count: 0,
            }))
    }

    /// Retention sweep over `scratchpad`. Idempotent.
    pub async fn cleanup_memory(&self, retention_days: u32) -> Result<u64, RagError> {
        let cutoff = now_millis() - (retention_days as i64) * 24 * 60 * 60 * 1000;
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<u64, RagError> {
            let guard = conn.lock().expect("rag db mutex poisoned");
            let ids: Vec<String> = {
                let mut stmt = guard.prepare(
                    "SELECT id FROM documents WHERE dataset = ?1 AND created_at < ?2",
                )?;
                let rows = stmt.query_map(params![Dataset::Scratchpad.as_str(), cutoff], |r| r.get(0))?;
                rows.collect::<Result<_, _>>()?
            };
            for id in &ids {
                guard.execute("DELETE FROM chunks WHERE document_id = ?1", params![id])?;
                guard.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
            }
            Ok(ids.len() as u64)
        })
        .await
        .map_err(|e| RagError::Storage(e.to_string()))?
    }
}

fn row_to_document(r: &rusqlite::Row) -> rusqlite::Result<Document> {
    let dataset_str: String = r.get(1)?;
    let metadata_str: String = r.get(4)?;
    Ok(Document {
        id: r.get(0)?,
        dataset: Dataset::canonicalize(&dataset_str),
        filename: r.get(2)?,
        content: r.get(3)?,
        metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::Value::Null),
        version: r.get(5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::LocalEmbedder;

    fn store() -> RagStore {
        RagStore::open_in_memory(Arc::new(LocalEmbedder::new())).unwrap()
    }

    #[tokio::test]
    async fn idempotent_reingest_bumps_version_without_changing_id() {
        let store = store();
        let id1 = store
            .add_document("projects", "a.txt", "hello world", serde_json::json!({}))
            .await
            .unwrap();
        let id2 = store
            .add_document("projects", "a.txt", "hello world", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(id1, id2);
        let docs = store.list_documents("projects").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].version, 2);
    }

    #[tokio::test]
    async fn dataset_isolation_in_query() {
        let store = store();
        store
            .add_document("projects", "p.txt", "a project document about rust", serde_json::json!({}))
            .await
            .unwrap();
        store
            .add_document("scratchpad", "s.txt", "a project document about rust", serde_json::json!({}))
            .await
            .unwrap();
        let hits = store
            .query("projects", "rust project", 10, QueryFilters::default())
            .await
            .unwrap();
        assert!(hits.iter().all(|h| {
            // every hit must have come from the projects-dataset document
            h.filename == "p.txt"
        }));
    }

    #[tokio::test]
    async fn cascade_delete_removes_chunks() {
        let store = store();
        let id = store
            .add_document("scratchpad", "x.txt", "some scratch content", serde_json::json!({}))
            .await
            .unwrap();
        store.delete_document(&id).await.unwrap();
        let hits = store.query("scratchpad", "scratch", 10, QueryFilters::default()).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn retention_sweep_only_removes_expired_scratchpad_docs() {
        let store = store();
        store
            .add_document("scratchpad", "fresh.txt", "fresh note", serde_json::json!({}))
            .await
            .unwrap();
        store
            .add_document("agent_core", "rule.txt", "permanent rule", serde_json::json!({}))
            .await
            .unwrap();
        let deleted = store.cleanup_memory(7).await.unwrap();
        assert_eq!(deleted, 0);
        let scratch = store.list_documents("scratchpad").await.unwrap();
        assert_eq!(scratch.len(), 1);
        let core = store.list_documents("agent_core").await.unwrap();
        assert_eq!(core.len(), 1);
    }

    #[tokio::test]
    async fn query_empty_dataset_returns_empty_not_error() {
        let store = store();
        let hits = store.query("projects", "anything", 5, QueryFilters::default()).await.unwrap();
        assert!(hits.is_empty());
    }
}
