//! [`ContextBuilder::build_super_context`]: a parallel
//! fan-out across Session Memory, RAG, and optional live tool
//! snapshots, bounded to a predictable total size.

use crate::profile::IntentProfile;
use crate::types::{SourceOutcome, SuperContext, SuperContextMetadata};
use kernel_core::SessionId;
use kernel_memory::MemoryStore;
use kernel_rag::{QueryFilters, RagStore};
use kernel_toolclient::ToolClientRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Soft per-source deadline: exceeding it only logs a warning.
const SOFT_TIMEOUT: Duration = Duration::from_secs(2);
/// Hard per-source deadline: exceeding it fails that source.
const HARD_TIMEOUT: Duration = Duration::from_secs(5);
/// Per-source serialized-size cap, in bytes.
const PER_SOURCE_CAP: usize = 4096;
/// `memory.get_context`'s message window.
const MEMORY_CONTEXT_MESSAGES: usize = 5;

/// Assembles a [`SuperContext`] for the Planner.
pub struct ContextBuilder {
    memory: Arc<dyn MemoryStore>,
    rag: Arc<RagStore>,
    tools: ToolClientRegistry,
}

impl ContextBuilder {
    /// Construct a builder over the given memory and RAG backends, with
    /// an optional set of live-tool clients (vision/audio/system).
    pub fn new(memory: Arc<dyn MemoryStore>, rag: Arc<RagStore>, tools: ToolClientRegistry) -> Self {
        Self { memory, rag, tools }
    }

    /// Run every source concurrently and assemble the bounded-size result.
    pub async fn build_super_context(
        &self,
        user_message: &str,
        session_id: &SessionId,
        profile: IntentProfile,
    ) -> SuperContext {
        let memory_context_fut = self.fetch_memory_context(session_id);
        let memory_search_fut = self.fetch_memory_search(user_message, session_id);
        let rag_fut = self.fetch_rag(user_message, profile);
        let vision_fut = self.fetch_tool_snapshot("vision", "analyze_screenshot");
        let audio_fut = self.fetch_tool_snapshot("audio", "transcribe");
        let system_fut = self.fetch_tool_snapshot("system", "snapshot");

        let (memory_context, memory_search, rag, vision, audio, system) = tokio::join!(
            memory_context_fut,
            memory_search_fut,
            rag_fut,
            vision_fut,
            audio_fut,
            system_fut,
        );

        let mut sources_available = Vec::new();
        if memory_context.is_ok() {
            sources_available.push("memory_context".to_string());
        }
        if memory_search.is_ok() {
            sources_available.push("memory_search".to_string());
        }
        for (dataset, outcome) in &rag {
            if outcome.is_ok() {
                sources_available.push(format!("rag:{dataset}"));
            }
        }
        if vision.as_ref().is_some_and(SourceOutcome::is_ok) {
            sources_available.push("vision".to_string());
        }
        if audio.as_ref().is_some_and(SourceOutcome::is_ok) {
            sources_available.push("audio".to_string());
        }
        if system.as_ref().is_some_and(SourceOutcome::is_ok) {
            sources_available.push("system".to_string());
        }

        let partial = SuperContext {
            memory_context,
            memory_search,
            rag,
            vision,
            audio,
            system,
            metadata: SuperContextMetadata {
                sources_available,
                total_context_size: 0,
            },
        };
        let total_context_size = serde_json::to_vec(&partial).map(|v| v.len()).unwrap_or(0);

        SuperContext {
            metadata: SuperContextMetadata {
                total_context_size,
                ..partial.metadata
            },
            ..partial
        }
    }

    async fn fetch_memory_context(&self, session_id: &SessionId) -> SourceOutcome<String> {
        run_with_timeouts("memory_context", async {
            self.memory
                .get_context(session_id, MEMORY_CONTEXT_MESSAGES)
                .await
                .map(|s| truncate(&s, PER_SOURCE_CAP))
                .map_err(|e| e.to_string())
        })
        .await
    }

    async fn fetch_memory_search(
        &self,
        user_message: &str,
        session_id: &SessionId,
    ) -> SourceOutcome<Vec<kernel_memory::SessionSearchHit>> {
        run_with_timeouts("memory_search", async {
            self.memory
                .search(user_message, Some(session_id), 5)
                .await
                .map_err(|e| e.to_string())
        })
        .await
    }

    async fn fetch_rag(
        &self,
        user_message: &str,
        profile: IntentProfile,
    ) -> BTreeMap<String, SourceOutcome<Vec<kernel_rag::ChunkMatch>>> {
        let handles: Vec<_> = profile
            .rag_top_k()
            .into_iter()
            .map(|(dataset, top_k)| {
                let rag = self.rag.clone();
                let user_message = user_message.to_string();
                (
                    dataset,
                    tokio::spawn(async move {
                        run_with_timeouts(dataset, async {
                            rag.query(dataset, &user_message, top_k, QueryFilters::default())
                                .await
                                .map_err(|e| e.to_string())
                        })
                        .await
                    }),
                )
            })
            .collect();

        let mut out = BTreeMap::new();
        for (dataset, handle) in handles {
            let outcome = handle.await.unwrap_or(SourceOutcome::Error {
                error: format!("{dataset} query task panicked"),
            });
            out.insert(dataset.to_string(), outcome);
        }
        out
    }

    async fn fetch_tool_snapshot(&self, tool: &str, action: &str) -> Option<SourceOutcome<serde_json::Value>> {
        if self.tools.get(tool).is_none() {
            return None;
        }
        let outcome = run_with_timeouts(tool, async {
            let resp = self.tools.call(tool, action, std::collections::HashMap::new()).await;
            if resp.ok {
                Ok(resp.data.unwrap_or(serde_json::Value::Null))
            } else {
                Err(resp.error_message.unwrap_or_else(|| "tool call failed".to_string()))
            }
        })
        .await;
        Some(outcome)
    }
}

/// Run `fut` against the soft/hard timeout pair, logging when the soft
/// deadline is exceeded but still letting the source complete up to
/// the hard deadline.
async fn run_with_timeouts<T, F>(label: &str, fut: F) -> SourceOutcome<T>
where
    F: std::future::Future<Output = Result<T, String>>,
{
    let start = std::time::Instant::now();
    match tokio::time::timeout(HARD_TIMEOUT, fut).await {
        Ok(Ok(data)) => {
            if start.elapsed() > SOFT_TIMEOUT {
                warn!(source = label, elapsed_ms = start.elapsed().as_millis() as u64, "context source exceeded soft timeout");
            }
            SourceOutcome::Ok { data }
        }
        Ok(Err(error)) => SourceOutcome::Error { error },
        Err(_) => SourceOutcome::Error {
            error: format!("{label} timed out after {:?}", HARD_TIMEOUT),
        },
    }
}

/// Truncate `s` to at most `max_bytes`, cutting on a char boundary and
/// appending `"…"` when truncation occurred.
fn truncate(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory::InMemorySessionStore;
    use kernel_rag::LocalEmbedder;

    fn builder() -> ContextBuilder {
        let memory: Arc<dyn MemoryStore> = Arc::new(InMemorySessionStore::new());
        let rag = Arc::new(RagStore::open_in_memory(Arc::new(LocalEmbedder::new())).unwrap());
        ContextBuilder::new(memory, rag, ToolClientRegistry::new())
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "a".repeat(10) + "€"; // 3-byte char at the boundary
        let truncated = truncate(&s, 11);
        assert!(truncated.ends_with('…'));
        assert!(truncated.is_char_boundary(truncated.len() - '…'.len_utf8()));
    }

    #[test]
    fn truncate_leaves_short_strings_untouched() {
        assert_eq!(truncate("hello", 4096), "hello");
    }

    #[tokio::test]
    async fn build_super_context_never_panics_with_no_tools_registered() {
        let builder = builder();
        let session_id = SessionId::new("s1");
        let ctx = builder.build_super_context("hello", &session_id, IntentProfile::Balanced).await;
        assert!(ctx.vision.is_none());
        assert!(ctx.audio.is_none());
        assert!(ctx.system.is_none());
        assert!(ctx.memory_context.is_ok());
        assert_eq!(ctx.rag.len(), 4);
        assert!(ctx.metadata.total_context_size > 0);
    }

    #[tokio::test]
    async fn rag_dataset_keys_match_the_active_profile() {
        let builder = builder();
        let session_id = SessionId::new("s1");
        let ctx = builder.build_super_context("hello", &session_id, IntentProfile::ProjectHeavy).await;
        assert!(ctx.rag.contains_key("projects"));
        assert!(ctx.rag.contains_key("agent_core"));
    }
}
