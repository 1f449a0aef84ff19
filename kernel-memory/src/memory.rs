//! Ephemeral, non-persistent [`MemoryStore`] for tests and throwaway deployments.

use crate::error::MemoryError;
use crate::store::MemoryStore;
use crate::types::{SessionMessage, SessionSearchHit};
use async_trait::async_trait;
use kernel_core::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory session store. Data does not survive process restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<SessionMessage>>>,
    embedder: Option<Arc<dyn kernel_rag::Embedder>>,
}

impl InMemorySessionStore {
    /// Create an empty store with no embedder (substring search only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an [`kernel_rag::Embedder`] for similarity-ranked search.
    pub fn with_embedder(embedder: Arc<dyn kernel_rag::Embedder>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            embedder: Some(embedder),
        }
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl MemoryStore for InMemorySessionStore {
    async fn add_message(
        &self,
        session_id: &SessionId,
        role: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<(), MemoryError> {
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
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.as_str().to_string()).or_default().push(message);
        Ok(())
    }

    async fn get_messages(
        &self,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<SessionMessage>, MemoryError> {
        let sessions = self.sessions.read().await;
        let Some(messages) = sessions.get(session_id.as_str()) else {
            return Ok(Vec::new());
        };
        let mut out = messages.clone();
        if let Some(limit) = limit {
            if out.len() > limit {
                out = out.split_off(out.len() - limit);
            }
        }
        Ok(out)
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

        let sessions = self.sessions.read().await;
        let mut hits = Vec::new();
        for (id, messages) in sessions.iter() {
            if let Some(wanted) = session_id {
                if wanted.as_str() != id {
                    continue;
                }
            }
            for message in messages {
                let substring_hit = message.content.to_ascii_lowercase().contains(&needle);
                let similarity = match (&query_embedding, &message.embedding) {
                    (Some(q), Some(m)) => Some(kernel_rag::cosine_similarity(q, m)),
                    _ => None,
                };
                if substring_hit || similarity.is_some() {
                    hits.push(SessionSearchHit {
                        session_id: id.clone(),
                        message: message.clone(),
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
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id.as_str());
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionId>, MemoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.keys().map(|k| SessionId::new(k.as_str())).collect())
    }

    async fn archive_sweep(&self, _max_age_days: u32) -> Result<u64, MemoryError> {
        // Nothing to archive: the in-memory backend has no active/archive split.
        Ok(0)
    }
}
