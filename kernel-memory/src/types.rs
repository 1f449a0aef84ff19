//! Types persisted by a [`crate::MemoryStore`].

use serde::{Deserialize, Serialize};

/// One turn in a session's conversation history.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    /// `"user"`, `"assistant"`, `"system"`, or a caller-defined role tag.
    pub role: String,
    /// The message text.
    pub content: String,
    /// Unix millis this message was appended.
    pub timestamp: i64,
    /// Caller-supplied metadata (e.g. `{"project": "foo"}`).
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Precomputed embedding of `content`, if an [`crate::Embedder`] was configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl SessionMessage {
    /// Render one line of [`crate::MemoryStore::get_context`]'s output.
    pub fn render_line(&self) -> String {
        format!("[{}] {}\n", self.role, self.content)
    }

    /// The `metadata.project` field, if present.
    pub fn project(&self) -> Option<&str> {
        self.metadata.get("project").and_then(|v| v.as_str())
    }
}

/// One hit from [`crate::MemoryStore::search`].
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSearchHit {
    /// Which session the message belongs to.
    pub session_id: String,
    /// The matching message.
    pub message: SessionMessage,
    /// Cosine similarity to the query, or `None` when only substring
    /// matching was available (no embedder configured).
    pub similarity: Option<f32>,
}
