//! Rule-based proactive suggestions.
//!
//! Unlike the rest of the Cognitive Engine, this is not LLM-based: it's
//! a fixed table of thresholds over counters the caller already has in
//! hand, checked in order, any number of which may fire.

use serde::{Deserialize, Serialize};

/// A single proactive nudge the caller may choose to act on.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// The action the caller might take (e.g. `"summarize_session"`).
    pub action: String,
    /// Why this suggestion fired.
    pub reason: String,
}

impl Suggestion {
    fn new(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { action: action.into(), reason: reason.into() }
    }
}

/// Counters the caller supplies from its own bookkeeping; no Timeline
/// or RAG access happens here, so this function is synchronous and total.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuggestionContext {
    /// Timeline events recorded since the last summary.
    pub events_since_summary: u64,
    /// Vision-analysis events recorded since the last vision sync.
    pub vision_events_since_sync: u64,
    /// Documents currently held in the `scratchpad` dataset.
    pub scratchpad_document_count: u64,
}

const SUMMARY_EVENT_THRESHOLD: u64 = 50;
const VISION_SYNC_THRESHOLD: u64 = 3;
const SCRATCHPAD_DOCUMENT_THRESHOLD: u64 = 20;

/// Evaluate the fixed rule table against `ctx`, in order. Every rule
/// that matches fires — this is not a short-circuiting pipeline.
pub fn proactive_suggestions(ctx: &SuggestionContext) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if ctx.events_since_summary > SUMMARY_EVENT_THRESHOLD {
        out.push(Suggestion::new(
            "summarize_session",
            format!("{} events since the last summary", ctx.events_since_summary),
        ));
    }

    if ctx.vision_events_since_sync > VISION_SYNC_THRESHOLD {
        out.push(Suggestion::new(
            "sync_vision_to_rag",
            format!("{} vision analyses since the last sync", ctx.vision_events_since_sync),
        ));
    }

    if ctx.scratchpad_document_count > SCRATCHPAD_DOCUMENT_THRESHOLD {
        out.push(Suggestion::new(
            "cleanup_scratchpad",
            format!("scratchpad holds {} documents", ctx.scratchpad_document_count),
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_suggestions_below_all_thresholds() {
        let ctx = SuggestionContext {
            events_since_summary: 1,
            vision_events_since_sync: 1,
            scratchpad_document_count: 1,
        };
        assert!(proactive_suggestions(&ctx).is_empty());
    }

    #[test]
    fn summary_suggestion_fires_past_threshold() {
        let ctx = SuggestionContext { events_since_summary: 51, ..Default::default() };
        let suggestions = proactive_suggestions(&ctx);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].action, "summarize_session");
    }

    #[test]
    fn all_three_can_fire_together() {
        let ctx = SuggestionContext {
            events_since_summary: 51,
            vision_events_since_sync: 4,
            scratchpad_document_count: 21,
        };
        assert_eq!(proactive_suggestions(&ctx).len(), 3);
    }

    #[test]
    fn thresholds_are_exclusive() {
        let ctx = SuggestionContext {
            events_since_summary: SUMMARY_EVENT_THRESHOLD,
            vision_events_since_sync: VISION_SYNC_THRESHOLD,
            scratchpad_document_count: SCRATCHPAD_DOCUMENT_THRESHOLD,
        };
        assert!(proactive_suggestions(&ctx).is_empty());
    }
}
