//! Filesystem-backed [`MemoryStore`]: one append-only JSONL file per
//! session, laid out hierarchically under a root directory.

use crate::error::MemoryError;
use crate::store::MemoryStore;
use crate::types::{SessionMessage, SessionSearchHit};
use async_trait::async_trait;
use kernel_core::SessionId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;

const ARCHIVE_DIR: &str = "archive";
const ACTIVE_DIR: &str = "active";
const PROJECTS_DIR: &str = "projects";
const TESTS_DIR: &str = "tests";

/// Filesystem-backed session memory.
///
/// Directory layout:
/// ```text
/// root/
///   active/<session>.jsonl
///   archive/YYYY-MM/<session>.jsonl
///   projects/<project>/<session>.jsonl
///   tests/<session>.jsonl
/// ```
pub struct FsSessionStore {
    root: PathBuf,
    embedder: Option<Arc<dyn kernel_rag::Embedder>>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl FsSessionStore {
    /// Create a store rooted at `root`, with no embedder (substring search only).
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            embedder: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store with an [`kernel_rag::Embedder`] for similarity-ranked search.
    pub fn with_embedder(root: &Path, embedder: Arc<dyn kernel_rag::Embedder>) -> Self {
        Self {
            root: root.to_path_buf(),
            embedder: Some(embedder),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, session_id: &SessionId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("memory store lock poisoned");
        locks
            .entry(session_id.as_str().to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// The path a brand-new session should be created at.
    fn new_session_path(&self, session_id: &SessionId, metadata: &serde_json::Value) -> PathBuf {
        if session_id.is_test_session() {
            return self.root.join(TESTS_DIR).join(filename(session_id));
        }
        if let Some(project) = metadata.get("project").and_then(|v| v.as_str()) {
            let safe_project = SessionId::sanitize(project);
            return self
                .root
                .join(PROJECTS_DIR)
                .join(safe_project.as_str())
                .join(filename(session_id));
        }
        self.root.join(ACTIVE_DIR).join(filename(session_id))
    }

    /// Find an existing session's file, searching every bucket.
    async fn locate(&self, session_id: &SessionId) -> Option<PathBuf> {
        let name = filename(session_id);
        let candidates = [
            self.root.join(TESTS_DIR).join(&name),
            self.root.join(ACTIVE_DIR).join(&name),
        ];
        for c in candidates {
            if tokio::fs::try_exists(&c).await.unwrap_or(false) {
                return Some(c);
            }
        }
        if let Ok(mut entries) = tokio::fs::read_dir(self.root.join(PROJECTS_DIR)).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let candidate = entry.path().join(&name);
                if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                    return Some(candidate);
                }
            }
        }
        if let Ok(mut entries) = tokio::fs::read_dir(self.root.join(ARCHIVE_DIR)).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let candidate = entry.path().join(&name);
                if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    async fn read_all(&self, path: &Path) -> Result<Vec<SessionMessage>, MemoryError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(|e| MemoryError::Serialization(e.to_string())))
            .collect()
    }

    async fn all_session_files(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for dir in [self.root.join(ACTIVE_DIR), self.root.join(TESTS_DIR)] {
            collect_jsonl(&dir, &mut out).await;
        }
        for base in [self.root.join(PROJECTS_DIR), self.root.join(ARCHIVE_DIR)] {
            if let Ok(mut entries) = tokio::fs::read_dir(&base).await {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    collect_jsonl(&entry.path(), &mut out).await;
                }
            }
        }
        out
    }
}

async fn collect_jsonl(dir: &Path, out: &mut Vec<PathBuf>) {
    if let Ok(mut entries) = tokio::fs::read_dir(dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                out.push(path);
            }
        }
    }
}

fn filename(session_id: &SessionId) -> String {
    format!("{}.jsonl", session_id.as_str())
}

fn session_id_from_path(path: &Path) -> Option<SessionId> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(SessionId::new)
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl MemoryStore for FsSessionStore {
    async fn add_message(
        &self,
        session_id: &SessionId,
        role: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<(), MemoryError> {
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;

        let path = match self.locate(session_id).await {
            Some(p) => p,
            None => self.new_session_path(session_id, &metadata),
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let embedding = match &self.embedder {
            Some(e) => e.embed_one(content).await.ok(),
            None => None,
        };

        let message = SessionMessage {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: now_millis(),
            metadata,
            embedding,
        };
        let line = serde_json::to_string(&message).map_err(|e| MemoryError::Serialization(e.to_string()))?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }

    async fn get_messages(
        &self,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<SessionMessage>, MemoryError> {
        let Some(path) = self.locate(session_id).await else {
            return Ok(Vec::new());
        };
        let mut messages = self.read_all(&path).await?;
        if let Some(limit) = limit {
            if messages.len() > limit {
                messages = messages.split_off(messages.len() - limit);
            }
        }
        Ok(messages)
    }

    async fn search(
        &self,
        query: &str,
        session_id: Option<&SessionId>,
        limit: usize,
    ) -> Result<Vec<SessionSearchHit>, MemoryError> {
        let needle = query.to_ascii_lowercase();
        let query_embedding = match &self.embedder {
            Some(e) => e.embed_one(query).await.ok(),
            None => None,
        };

        let files = match session_id {
            Some(id) => self.locate(id).await.into_iter().collect(),
            None => self.all_session_files().await,
        };

        let mut hits = Vec::new();
        for path in files {
            let Some(id) = session_id_from_path(&path).or_else(|| session_id.cloned()) else {
                continue;
            };
            for message in self.read_all(&path).await? {
                let substring_hit = message.content.to_ascii_lowercase().contains(&needle);
                let similarity = match (&query_embedding, &message.embedding) {
                    (Some(q), Some(m)) => Some(kernel_rag::cosine_similarity(q, m)),
                    _ => None,
                };
                if substring_hit || similarity.is_some() {
                    hits.push(SessionSearchHit {
                        session_id: id.as_str().to_string(),
                        message,
                        similarity,
                    });
                }
            }
        }

        hits.sort_by(|a, b| match (a.similarity, b.similarity) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.message.timestamp.cmp(&a.message.timestamp),
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn clear_session(&self, session_id: &SessionId) -> Result<(), MemoryError> {
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;
        if let Some(path) = self.locate(session_id).await {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionId>, MemoryError> {
        let files = self.all_session_files().await;
        Ok(files.into_iter().filter_map(|p| session_id_from_path(&p)).collect())
    }

    async fn archive_sweep(&self, max_age_days: u32) -> Result<u64, MemoryError> {
        let active_dir = self.root.join(ACTIVE_DIR);
        let mut moved = 0u64;
        let cutoff = now_millis() - (max_age_days as i64) * 24 * 60 * 60 * 1000;

        let mut entries = match tokio::fs::read_dir(&active_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let Some(session_id) = session_id_from_path(&path) else { continue };
            let messages = self.read_all(&path).await?;
            let last_write = messages.last().map(|m| m.timestamp).unwrap_or(0);
            if last_write >= cutoff {
                continue;
            }

            let lock = self.lock_for(&session_id);
            let _guard = lock.lock().await;
            let bucket = month_bucket(last_write);
            let dest_dir = self.root.join(ARCHIVE_DIR).join(bucket);
            tokio::fs::create_dir_all(&dest_dir).await?;
            let dest = dest_dir.join(filename(&session_id));
            tokio::fs::rename(&path, &dest).await?;
            moved += 1;
        }
        Ok(moved)
    }
}

/// Format a unix-millis timestamp as an archive bucket name `YYYY-MM`.
fn month_bucket(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).expect("epoch is representable"))
        .format("%Y-%m")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsSessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn append_then_read_roundtrips() {
        let (_dir, store) = store();
        let id = SessionId::new("s1");
        store.add_message(&id, "user", "hello", serde_json::json!({})).await.unwrap();
        store.add_message(&id, "assistant", "hi", serde_json::json!({})).await.unwrap();
        let messages = store.get_messages(&id, None).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn get_messages_honors_limit_as_tail() {
        let (_dir, store) = store();
        let id = SessionId::new("s1");
        for i in 0..5 {
            store.add_message(&id, "user", &format!("msg{i}"), serde_json::json!({})).await.unwrap();
        }
        let tail = store.get_messages(&id, Some(2)).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "msg3");
        assert_eq!(tail[1].content, "msg4");
    }

    #[tokio::test]
    async fn get_context_renders_bracketed_role_lines() {
        let (_dir, store) = store();
        let id = SessionId::new("s1");
        store.add_message(&id, "user", "hello", serde_json::json!({})).await.unwrap();
        let ctx = store.get_context(&id, 10).await.unwrap();
        assert_eq!(ctx, "[user] hello\n");
    }

    #[tokio::test]
    async fn test_session_prefix_lives_under_tests_dir() {
        let (dir, store) = store();
        let id = SessionId::new("test_abc");
        store.add_message(&id, "user", "hi", serde_json::json!({})).await.unwrap();
        assert!(dir.path().join(TESTS_DIR).join("test_abc.jsonl").exists());
    }

    #[tokio::test]
    async fn project_metadata_routes_to_project_bucket() {
        let (dir, store) = store();
        let id = SessionId::new("proj-session");
        store
            .add_message(&id, "user", "hi", serde_json::json!({"project": "rocket"}))
            .await
            .unwrap();
        assert!(dir.path().join(PROJECTS_DIR).join("rocket").join("proj-session.jsonl").exists());

        // subsequent writes without metadata still land in the same file
        store.add_message(&id, "assistant", "hello", serde_json::json!({})).await.unwrap();
        let messages = store.get_messages(&id, None).await.unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn substring_search_finds_matching_messages() {
        let (_dir, store) = store();
        let id = SessionId::new("s1");
        store.add_message(&id, "user", "the quick brown fox", serde_json::json!({})).await.unwrap();
        store.add_message(&id, "user", "totally unrelated", serde_json::json!({})).await.unwrap();
        let hits = store.search("QUICK", Some(&id), 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].message.content.contains("quick"));
    }

    #[tokio::test]
    async fn clear_session_removes_its_file() {
        let (_dir, store) = store();
        let id = SessionId::new("s1");
        store.add_message(&id, "user", "hi", serde_json::json!({})).await.unwrap();
        store.clear_session(&id).await.unwrap();
        let messages = store.get_messages(&id, None).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn list_sessions_covers_every_bucket() {
        let (_dir, store) = store();
        store
            .add_message(&SessionId::new("active1"), "user", "hi", serde_json::json!({}))
            .await
            .unwrap();
        store
            .add_message(&SessionId::new("test_1"), "user", "hi", serde_json::json!({}))
            .await
            .unwrap();
        store
            .add_message(&SessionId::new("proj1"), "user", "hi", serde_json::json!({"project": "p"}))
            .await
            .unwrap();
        let mut ids: Vec<String> = store.list_sessions().await.unwrap().into_iter().map(|s| s.0).collect();
        ids.sort();
        assert_eq!(ids, vec!["active1", "proj1", "test_1"]);
    }

    #[tokio::test]
    async fn archive_sweep_moves_old_sessions_only() {
        let (dir, store) = store();
        let old = SessionId::new("old-session");
        store.add_message(&old, "user", "ancient", serde_json::json!({})).await.unwrap();

        // backdate the file by rewriting its single message with an old timestamp
        let path = dir.path().join(ACTIVE_DIR).join("old-session.jsonl");
        let ancient = SessionMessage {
            role: "user".into(),
            content: "ancient".into(),
            timestamp: 0,
            metadata: serde_json::json!({}),
            embedding: None,
        };
        tokio::fs::write(&path, format!("{}\n", serde_json::to_string(&ancient).unwrap())).await.unwrap();

        let fresh = SessionId::new("fresh-session");
        store.add_message(&fresh, "user", "new", serde_json::json!({})).await.unwrap();

        let moved = store.archive_sweep(7).await.unwrap();
        assert_eq!(moved, 1);
        assert!(!dir.path().join(ACTIVE_DIR).join("old-session.jsonl").exists());
        assert!(dir.path().join(ACTIVE_DIR).join("fresh-session.jsonl").exists());
    }

    #[test]
    fn month_bucket_formats_epoch_as_1970_01() {
        assert_eq!(month_bucket(0), "1970-01");
    }
}
