//! [`SuperContext`] and its building blocks.

use serde::{Deserialize, Serialize};

/// The outcome of fetching one context source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome<T> {
    /// The source answered in time.
    Ok {
        /// The source's data, possibly truncated to the per-source cap.
        data: T,
    },
    /// The source timed out or returned an error; the build continues regardless.
    Error {
        /// A human-readable description of what went wrong.
        error: String,
    },
}

impl<T> SourceOutcome<T> {
    /// Whether this source contributed data.
    pub fn is_ok(&self) -> bool {
        matches!(self, SourceOutcome::Ok { .. })
    }
}

/// One dataset's RAG query result within a [`SuperContext`].
pub type RagOutcome = SourceOutcome<Vec<kernel_rag::ChunkMatch>>;

/// The bounded-size context object handed to the Planner.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperContext {
    /// `memory.get_context` rendering of the session's recent history.
    pub memory_context: SourceOutcome<String>,
    /// `memory.search(user_message)` hits.
    pub memory_search: SourceOutcome<Vec<kernel_memory::SessionSearchHit>>,
    /// RAG query outcomes keyed by dataset tag.
    pub rag: std::collections::BTreeMap<String, RagOutcome>,
    /// Current Vision tool snapshot, if a Vision tool-client is registered.
    pub vision: Option<SourceOutcome<serde_json::Value>>,
    /// Current Audio tool snapshot, if an Audio tool-client is registered.
    pub audio: Option<SourceOutcome<serde_json::Value>>,
    /// Current System tool snapshot, if a System tool-client is registered.
    pub system: Option<SourceOutcome<serde_json::Value>>,
    /// Build metadata.
    pub metadata: SuperContextMetadata,
}

/// Metadata describing how a [`SuperContext`] was assembled.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperContextMetadata {
    /// Names of sources that answered successfully.
    pub sources_available: Vec<String>,
    /// Serialized byte size of the assembled context.
    pub total_context_size: usize,
}
