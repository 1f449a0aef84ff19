//! Row types the store reads and writes.

use kernel_core::Dataset;
use serde::{Deserialize, Serialize};

/// A stored document.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Deterministic id: hash of `(dataset, filename, content prefix)`.
    pub id: String,
    /// Canonicalized dataset this document lives in.
    pub dataset: Dataset,
    /// Caller-supplied filename.
    pub filename: String,
    /// Full document content (current version).
    pub content: String,
    /// Caller-supplied metadata.
    pub metadata: serde_json::Value,
    /// Monotonic version counter, starting at 1.
    pub version: u32,
    /// Unix millis of first ingestion.
    pub created_at: i64,
    /// Unix millis of the most recent write.
    pub updated_at: i64,
}

/// An archived prior version of a [`Document`]'s content, written on re-ingest.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVersion {
    /// The document this version belonged to.
    pub document_id: String,
    /// The version number this row captures.
    pub version: u32,
    /// The content as of this version.
    pub content: String,
    /// The metadata as of this version.
    pub metadata: serde_json::Value,
    /// Unix millis this version was superseded.
    pub created_at: i64,
}

/// One similarity-search hit.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMatch {
    /// Owning document id.
    pub document_id: String,
    /// 0-based position of this chunk within its document.
    pub order_index: u32,
    /// The chunk's text.
    pub text: String,
    /// The owning document's filename.
    pub filename: String,
    /// The owning document's metadata, for caller-side filtering/display.
    pub metadata: serde_json::Value,
    /// Cosine similarity to the query, in `[0, 1]` (negative cosines clamp to 0).
    pub similarity: f32,
}

/// Optional filters applied to a [`crate::store::RagStore::query`] call.
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    /// Restrict to documents whose `metadata.type` equals this value.
    pub doc_type: Option<String>,
    /// Restrict to documents whose `metadata.priority` is at least this
    /// value, ordered `low < medium < high`.
    pub min_priority: Option<Priority>,
}

/// Document priority ordering used by [`QueryFilters::min_priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Lowest priority.
    Low,
    /// Default priority.
    Medium,
    /// Highest priority.
    High,
}

impl Priority {
    /// Parse a caller-supplied priority string; unknown values are dropped, not rejected.
    pub fn parse(s: &str) -> Option<Priority> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Summary counts for one dataset, returned by `get_dataset_info`.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// The dataset these counts describe.
    pub dataset: Dataset,
    /// Number of documents currently stored.
    pub document_count: u64,
    /// Number of chunks currently stored across those documents.
    pub chunk_count: u64,
}
