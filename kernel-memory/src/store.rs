//! The [`MemoryStore`] trait session memory implementations satisfy.

use crate::error::MemoryError;
use crate::types::{SessionMessage, SessionSearchHit};
use async_trait::async_trait;
use kernel_core::SessionId;

/// Append-only conversation history, keyed by sanitized session id.
///
/// Implementations are free to choose their own durability tradeoff
/// (filesystem-backed, in-memory for tests) behind this one contract.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Append one message to a session's history. Creates the session
    /// if it doesn't exist yet.
    async fn add_message(
        &self,
        session_id: &SessionId,
        role: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<(), MemoryError>;

    /// Return the most recent `limit` messages, oldest first. `None` returns the whole history.
    async fn get_messages(
        &self,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<SessionMessage>, MemoryError>;

    /// Case-insensitive substring search over a session's (or, if
    /// `session_id` is `None`, every session's) messages. When an
    /// embedder is configured, implementations additionally rank by
    /// cosine similarity and merge the two rankings.
    async fn search(
        &self,
        query: &str,
        session_id: Option<&SessionId>,
        limit: usize,
    ) -> Result<Vec<SessionSearchHit>, MemoryError>;

    /// Delete a session's entire history.
    async fn clear_session(&self, session_id: &SessionId) -> Result<(), MemoryError>;

    /// Every known session id.
    async fn list_sessions(&self) -> Result<Vec<SessionId>, MemoryError>;

    /// Move active sessions whose last write is older than `max_age_days`
    /// into their `archive/YYYY-MM/` bucket. Returns the count moved.
    async fn archive_sweep(&self, max_age_days: u32) -> Result<u64, MemoryError>;

    /// Deterministic textual rendering of the tail of a session's
    /// history: `"[role] content\n"` per message, newest-at-bottom.
    async fn get_context(
        &self,
        session_id: &SessionId,
        max_messages: usize,
    ) -> Result<String, MemoryError> {
        let messages = self.get_messages(session_id, Some(max_messages)).await?;
        Ok(messages.iter().map(SessionMessage::render_line).collect())
    }
}
