//! Timeline row and query types.

use kernel_core::{EventId, Modality};
use serde::{Deserialize, Serialize};

/// One recorded event.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Monotonic, per-store sequence number.
    pub id: EventId,
    /// The session this event belongs to.
    pub session_id: String,
    /// Caller-supplied event type tag (e.g. `"tool_call"`, `"vision_capture"`).
    pub event_type: String,
    /// Event payload.
    pub data: serde_json::Value,
    /// Caller-supplied metadata.
    pub metadata: serde_json::Value,
    /// Modality, either passed through or derived from `event_type`.
    pub modality: Modality,
    /// Unix millis this event was appended.
    pub timestamp: i64,
}

/// Filters applied to [`crate::Timeline::query`]. Results are always newest-first.
#[derive(Debug, Clone, Default)]
pub struct TimelineFilters {
    /// Restrict to one session.
    pub session_id: Option<String>,
    /// Restrict to one event type.
    pub event_type: Option<String>,
    /// Restrict to one modality.
    pub modality: Option<Modality>,
    /// Restrict to events at or after this unix-millis timestamp.
    pub since: Option<i64>,
    /// Cap the number of rows returned.
    pub limit: Option<usize>,
}
