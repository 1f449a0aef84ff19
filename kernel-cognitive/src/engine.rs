//! The Cognitive Engine: background housekeeping over a
//! session's Timeline, RAG store, and session memory.
//!
//! Progress through each sub-operation's backlog is tracked with a
//! Timeline marker event (`context_summary`, `vision_sync`,
//! `audio_sync`) appended after a successful run; the next run queries
//! `since` that marker's timestamp instead of keeping separate
//! per-session cursors.

use crate::error::CognitiveError;
use crate::suggestion::{proactive_suggestions as rule_based_suggestions, Suggestion, SuggestionContext};
use kernel_core::{Modality, SessionId};
use kernel_memory::MemoryStore;
use kernel_rag::RagStore;
use kernel_timeline::{Timeline, TimelineEvent, TimelineFilters};
use kernel_toolclient::ToolClientRegistry;
use std::collections::HashMap;
use std::sync::Arc;

const SUMMARY_EVENT_THRESHOLD: u64 = 50;
const SUMMARY_MARKER_EVENT: &str = "context_summary";
const VISION_SYNC_MARKER_EVENT: &str = "vision_sync";
const AUDIO_SYNC_MARKER_EVENT: &str = "audio_sync";

/// The outcome of one sub-operation within [`CognitiveEngine::run_autonomous_cycle`].
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Which sub-operation this is (`"autosummarize"`, `"sync_vision_to_rag"`, ...).
    pub step: String,
    /// A short description of what happened, or the error message if it failed.
    pub result: Result<String, String>,
}

/// The aggregated report from one autonomous cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// One entry per sub-operation, in invocation order.
    pub steps: Vec<StepOutcome>,
    /// Suggestions raised by the rule-based pass.
    pub suggestions: Vec<Suggestion>,
}

/// Background housekeeping over one kernel's stores. Every public
/// method is best-effort with respect to its siblings: a failure here
/// is captured as an `Err`, never a panic, so that
/// [`CognitiveEngine::run_autonomous_cycle`] can run every
/// sub-operation regardless of an earlier one's outcome.
pub struct CognitiveEngine {
    tools: Arc<ToolClientRegistry>,
    rag: Arc<RagStore>,
    memory: Arc<dyn MemoryStore>,
    timeline: Arc<Timeline>,
}

impl CognitiveEngine {
    /// Build an engine over the given stores and tool registry.
    pub fn new(
        tools: Arc<ToolClientRegistry>,
        rag: Arc<RagStore>,
        memory: Arc<dyn MemoryStore>,
        timeline: Arc<Timeline>,
    ) -> Self {
        Self { tools, rag, memory, timeline }
    }

    fn marker_since(&self, session_id: &str, marker_event: &str) -> Result<Option<i64>, CognitiveError> {
        let events = self.timeline.query(TimelineFilters {
            session_id: Some(session_id.to_string()),
            event_type: Some(marker_event.to_string()),
            limit: Some(1),
            ..Default::default()
        })?;
        Ok(events.into_iter().next().map(|e| e.timestamp))
    }

    fn events_since(&self, session_id: &str, since: Option<i64>) -> Result<Vec<TimelineEvent>, CognitiveError> {
        Ok(self.timeline.query(TimelineFilters {
            session_id: Some(session_id.to_string()),
            since,
            ..Default::default()
        })?)
    }

    async fn generate(&self, prompt: String) -> Result<String, CognitiveError> {
        let mut args = HashMap::new();
        args.insert("prompt".to_string(), serde_json::json!(prompt));
        let response = self.tools.call("llm", "generate", args).await;
        if !response.ok {
            return Err(CognitiveError::Llm(
                response.error_message.unwrap_or_else(|| "llm.generate failed".to_string()),
            ));
        }
        response
            .data
            .as_ref()
            .and_then(|d| d.get("text"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| CognitiveError::Llm("llm.generate returned no text".to_string()))
    }

    /// Summarize the session if more than [`SUMMARY_EVENT_THRESHOLD`]
    /// events have accrued since the last summary, or unconditionally
    /// when `force` is set. `Ok(None)` means the threshold wasn't met
    /// and nothing was written.
    pub async fn autosummarize(&self, session_id: &str, force: bool) -> Result<Option<String>, CognitiveError> {
        let since = self.marker_since(session_id, SUMMARY_MARKER_EVENT)?;
        let events = self.events_since(session_id, since)?;

        if events.is_empty() || (!force && (events.len() as u64) <= SUMMARY_EVENT_THRESHOLD) {
            return Ok(None);
        }

        // `events` is newest-first; the window is [oldest, newest].
        let t0 = events.last().expect("checked non-empty above").timestamp;
        let t1 = events.first().expect("checked non-empty above").timestamp;
        let rendering: String = events.iter().rev().map(|e| format!("[{}] {}\n", e.event_type, e.data)).collect();

        let summary = self
            .generate(format!("Summarize the following session activity:\n{rendering}"))
            .await?;

        self.rag
            .add_document(
                "context_flow",
                &format!("summary-{session_id}-{t1}"),
                &summary,
                serde_json::json!({"type": "context_data", "session_id": session_id, "range": [t0, t1]}),
            )
            .await?;

        self.timeline.append(
            session_id,
            SUMMARY_MARKER_EVENT,
            serde_json::json!({"range": [t0, t1]}),
            serde_json::json!({}),
            Some(Modality::Text),
        )?;

        Ok(Some(summary))
    }

    /// Derive a short textual description of every vision timeline
    /// event recorded since the last vision sync, and add each as an
    /// `agent_memory` document pointing back at the source event.
    pub async fn sync_vision_to_rag(&self, session_id: &str) -> Result<u64, CognitiveError> {
        let since = self.marker_since(session_id, VISION_SYNC_MARKER_EVENT)?;
        let events: Vec<_> =
            self.events_since(session_id, since)?.into_iter().filter(|e| e.modality == Modality::Vision).collect();

        let mut synced = 0u64;
        for event in &events {
            let description = match self.generate(format!(
                "Describe this vision event in one short sentence: {}",
                event.data
            )).await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(event_id = event.id.0, error = %e, "vision sync: skipping event");
                    continue;
                }
            };

            self.rag
                .add_document(
                    "agent_memory",
                    &format!("vision-{}-{}", session_id, event.id.0),
                    &description,
                    serde_json::json!({"type": "vision_description", "event_id": event.id.0}),
                )
                .await?;
            synced += 1;
        }

        self.timeline.append(
            session_id,
            VISION_SYNC_MARKER_EVENT,
            serde_json::json!({"synced": synced}),
            serde_json::json!({}),
            Some(Modality::Vision),
        )?;

        Ok(synced)
    }

    /// Append transcribed audio events recorded since the last audio
    /// sync as session messages with role `user`.
    pub async fn sync_audio_to_memory(&self, session_id: &str) -> Result<u64, CognitiveError> {
        let since = self.marker_since(session_id, AUDIO_SYNC_MARKER_EVENT)?;
        let events: Vec<_> =
            self.events_since(session_id, since)?.into_iter().filter(|e| e.modality == Modality::Audio).collect();

        let sid = SessionId::new(session_id);
        let mut synced = 0u64;
        for event in &events {
            let Some(transcript) = event.data.get("transcript").and_then(|v| v.as_str()) else {
                continue;
            };
            self.memory
                .add_message(&sid, "user", transcript, serde_json::json!({"source": "audio", "event_id": event.id.0}))
                .await?;
            synced += 1;
        }

        self.timeline.append(
            session_id,
            AUDIO_SYNC_MARKER_EVENT,
            serde_json::json!({"synced": synced}),
            serde_json::json!({}),
            Some(Modality::Audio),
        )?;

        Ok(synced)
    }

    /// Rule-based suggestions (not LLM-based) derived from current
    /// Timeline/RAG counters.
    pub async fn proactive_suggestions(&self, session_id: &str) -> Result<Vec<Suggestion>, CognitiveError> {
        let events_since_summary =
            self.events_since(session_id, self.marker_since(session_id, SUMMARY_MARKER_EVENT)?)?.len() as u64;
        let vision_events_since_sync = self
            .events_since(session_id, self.marker_since(session_id, VISION_SYNC_MARKER_EVENT)?)?
            .into_iter()
            .filter(|e| e.modality == Modality::Vision)
            .count() as u64;
        let scratchpad_document_count = self.rag.list_documents("scratchpad").await?.len() as u64;

        Ok(rule_based_suggestions(&SuggestionContext {
            events_since_summary,
            vision_events_since_sync,
            scratchpad_document_count,
        }))
    }

    /// Run autosummarize, vision sync, audio sync, and the suggestion
    /// pass in order, aggregating every outcome. One sub-operation
    /// failing never prevents the next one from running.
    pub async fn run_autonomous_cycle(&self, session_id: &str) -> CycleReport {
        let mut report = CycleReport::default();

        let summary = self.autosummarize(session_id, false).await;
        report.steps.push(StepOutcome {
            step: "autosummarize".to_string(),
            result: summary
                .map(|s| if s.is_some() { "summarized".to_string() } else { "skipped".to_string() })
                .map_err(|e| e.to_string()),
        });

        let vision = self.sync_vision_to_rag(session_id).await;
        report.steps.push(StepOutcome {
            step: "sync_vision_to_rag".to_string(),
            result: vision.map(|n| format!("synced {n}")).map_err(|e| e.to_string()),
        });

        let audio = self.sync_audio_to_memory(session_id).await;
        report.steps.push(StepOutcome {
            step: "sync_audio_to_memory".to_string(),
            result: audio.map(|n| format!("synced {n}")).map_err(|e| e.to_string()),
        });

        match self.proactive_suggestions(session_id).await {
            Ok(suggestions) => report.suggestions = suggestions,
            Err(e) => {
                report.steps.push(StepOutcome { step: "proactive_suggestions".to_string(), result: Err(e.to_string()) });
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kernel_core::{ErrorKind, ToolResponse};
    use kernel_memory::InMemorySessionStore;
    use kernel_rag::{LocalEmbedder, RagStore};
    use kernel_toolclient::ToolClient;

    struct StubLlm;

    #[async_trait]
    impl ToolClient for StubLlm {
        async fn call(&self, _action: &str, _args: HashMap<String, serde_json::Value>) -> ToolResponse {
            ToolResponse::ok("generate", serde_json::json!({"text": "a brief summary"}))
        }
        async fn health(&self) -> ToolResponse {
            ToolResponse::ok("health", serde_json::json!({"status": "ok"}))
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl ToolClient for FailingLlm {
        async fn call(&self, action: &str, _args: HashMap<String, serde_json::Value>) -> ToolResponse {
            ToolResponse::err(action, ErrorKind::RemoteError, "boom")
        }
        async fn health(&self) -> ToolResponse {
            ToolResponse::err("health", ErrorKind::RemoteError, "down")
        }
    }

    fn engine_with(llm: Arc<dyn ToolClient>) -> CognitiveEngine {
        let mut registry = ToolClientRegistry::new();
        registry.register("llm", llm);
        let rag = Arc::new(RagStore::open_in_memory(Arc::new(LocalEmbedder::new())).unwrap());
        let memory: Arc<dyn MemoryStore> = Arc::new(InMemorySessionStore::new());
        let timeline = Arc::new(Timeline::open_in_memory().unwrap());
        CognitiveEngine::new(Arc::new(registry), rag, memory, timeline)
    }

    #[tokio::test]
    async fn autosummarize_skips_below_threshold() {
        let engine = engine_with(Arc::new(StubLlm));
        engine.timeline.append("s1", "tool_call", serde_json::json!({}), serde_json::json!({}), None).unwrap();
        let result = engine.autosummarize("s1", false).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn autosummarize_forced_runs_regardless_of_threshold() {
        let engine = engine_with(Arc::new(StubLlm));
        engine.timeline.append("s1", "tool_call", serde_json::json!({}), serde_json::json!({}), None).unwrap();
        let result = engine.autosummarize("s1", true).await.unwrap();
        assert_eq!(result.as_deref(), Some("a brief summary"));
    }

    #[tokio::test]
    async fn autosummarize_propagates_llm_failure() {
        let engine = engine_with(Arc::new(FailingLlm));
        engine.timeline.append("s1", "tool_call", serde_json::json!({}), serde_json::json!({}), None).unwrap();
        assert!(engine.autosummarize("s1", true).await.is_err());
    }

    #[tokio::test]
    async fn sync_audio_to_memory_appends_transcripts() {
        let engine = engine_with(Arc::new(StubLlm));
        engine
            .timeline
            .append(
                "s1",
                "audio.transcribe",
                serde_json::json!({"transcript": "hello there"}),
                serde_json::json!({}),
                None,
            )
            .unwrap();
        let synced = engine.sync_audio_to_memory("s1").await.unwrap();
        assert_eq!(synced, 1);

        let messages = engine.memory.get_messages(&SessionId::new("s1"), None).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello there");
    }

    #[tokio::test]
    async fn sync_audio_to_memory_is_idempotent_after_marker() {
        let engine = engine_with(Arc::new(StubLlm));
        engine
            .timeline
            .append("s1", "audio.transcribe", serde_json::json!({"transcript": "x"}), serde_json::json!({}), None)
            .unwrap();
        assert_eq!(engine.sync_audio_to_memory("s1").await.unwrap(), 1);
        assert_eq!(engine.sync_audio_to_memory("s1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn run_autonomous_cycle_continues_past_a_failing_step() {
        let engine = engine_with(Arc::new(FailingLlm));
        for _ in 0..60 {
            engine.timeline.append("s1", "tool_call", serde_json::json!({}), serde_json::json!({}), None).unwrap();
        }
        let report = engine.run_autonomous_cycle("s1").await;
        assert_eq!(report.steps.len(), 4);
        assert!(report.steps[0].result.is_err());
        // sync_audio_to_memory has no audio events and no llm dependency, so it still succeeds.
        assert!(report.steps[2].result.is_ok());
    }
}
