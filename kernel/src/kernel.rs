//! The kernel root: wires the Tool-Client registry, Context Builder,
//! Planner, Executor, Cognitive Engine, and Intent router together
//! behind `orchestrate`.

use kernel_context::ContextBuilder;
use kernel_core::{ErrorKind, ExecutionMode, ExecutionResult, Plan, PlanStep, SessionId};
use kernel_executor::{CancelHandle, Executor};
use kernel_intent::{classify, Intent};
use kernel_memory::MemoryStore;
use kernel_planner::Planner;
use kernel_rag::RagStore;
use kernel_timeline::Timeline;
use kernel_toolclient::ToolClientRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

fn intent_profile(intent: Intent) -> kernel_context::IntentProfile {
    use kernel_context::IntentProfile;
    match intent {
        Intent::RulesQuery => IntentProfile::RulesHeavy,
        Intent::ProjectQuery => IntentProfile::ProjectHeavy,
        Intent::MemoryQuery => IntentProfile::MemoryHeavy,
        Intent::VisionAnalysis | Intent::AudioProcessing => IntentProfile::VisionAudioEnabled,
        Intent::General => IntentProfile::Balanced,
    }
}

/// Body of `POST /orchestrate`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrateRequest {
    /// The user's message.
    pub prompt: String,
    /// Which session this turn belongs to. Defaults to `"default"`.
    #[serde(default = "OrchestrateRequest::default_session_id")]
    pub session_id: String,
    /// `"auto"` (default), `"plan_only"`, or `"step_by_step"`.
    #[serde(default)]
    pub execution_mode: Option<String>,
}

impl OrchestrateRequest {
    fn default_session_id() -> String {
        "default".to_string()
    }

    fn mode(&self) -> ExecutionMode {
        match self.execution_mode.as_deref() {
            Some("plan_only") => ExecutionMode::PlanOnly,
            Some("step_by_step") => ExecutionMode::StepByStep,
            _ => ExecutionMode::Auto,
        }
    }
}

/// Response body of `POST /orchestrate`.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrateResponse {
    /// The classified coarse intent, rendered as a snake_case tag.
    pub intention: String,
    /// Fixed confidence placeholder — the classifier is a deterministic
    /// keyword match, not a scored model, so this is always 1.0 on a
    /// match and 0.0 on the `general` fallback.
    pub confidence: f32,
    /// The plan the Planner chose.
    pub plan: Vec<PlanStep>,
    /// A short natural-language summary of what happened.
    pub response: String,
    /// Results for every step actually attempted. Empty when `plan_only`.
    pub execution_results: Vec<ExecutionResult>,
    /// Whether the caller must confirm before the plan (or its tail) can run.
    pub requires_confirmation: bool,
    /// Which execution mode actually ran.
    pub execution_mode_used: String,
    /// Whether this turn appended anything to session memory.
    pub memory_updated: bool,
}

/// The kernel root. Owns every long-lived store and dispatches
/// `POST /orchestrate` requests against them.
pub struct Kernel {
    tools: Arc<ToolClientRegistry>,
    memory: Arc<dyn MemoryStore>,
    rag: Arc<RagStore>,
    timeline: Arc<Timeline>,
    context: ContextBuilder,
    planner: Planner,
    executor: Executor,
    cognitive: kernel_cognitive::CognitiveEngine,
}

impl Kernel {
    /// Wire a kernel over already-constructed stores and a populated
    /// Tool-Client registry. Storage construction (opening the RAG/
    /// Timeline/session-memory backends from [`crate::config::KernelConfig`])
    /// is the binary's job; this constructor is what tests exercise directly.
    pub fn new(
        tools: Arc<ToolClientRegistry>,
        memory: Arc<dyn MemoryStore>,
        rag: Arc<RagStore>,
        timeline: Arc<Timeline>,
    ) -> Self {
        let context = ContextBuilder::new(memory.clone(), rag.clone(), (*tools).clone());
        let planner = Planner::new(tools.clone());
        let executor = Executor::new(tools.clone(), Some(timeline.clone()));
        let cognitive = kernel_cognitive::CognitiveEngine::new(tools.clone(), rag.clone(), memory.clone(), timeline.clone());
        Self { tools, memory, rag, timeline, context, planner, executor, cognitive }
    }

    /// The Tool-Client registry this kernel dispatches through, for
    /// `/health` fan-out.
    pub fn tools(&self) -> &Arc<ToolClientRegistry> {
        &self.tools
    }

    /// Run one `run_autonomous_cycle` tick for `session_id`,
    /// invoked by either the interval ticker or the orchestration
    /// endpoint's post-hooks.
    pub async fn run_autonomous_cycle(&self, session_id: &str) -> kernel_cognitive::CycleReport {
        self.cognitive.run_autonomous_cycle(session_id).await
    }

    /// Every session the memory store currently knows about, for the
    /// interval ticker to fan `run_autonomous_cycle` out over.
    pub async fn known_sessions(&self) -> Vec<SessionId> {
        self.memory.list_sessions().await.unwrap_or_default()
    }

    /// Handle one `POST /orchestrate` turn end to end:
    /// classify intent, build the SuperContext, plan, execute (subject
    /// to mode and sensitive-step gating), and log the turn to memory.
    pub async fn orchestrate(&self, request: OrchestrateRequest) -> OrchestrateResponse {
        let session_id = SessionId::sanitize(&request.session_id);
        let mode = request.mode();

        let intent = classify(&request.prompt);
        let confidence = if intent == Intent::General { 0.0 } else { 1.0 };

        let ctx = self.context.build_super_context(&request.prompt, &session_id, intent_profile(intent)).await;
        let plan = self.planner.build_plan(&request.prompt, &ctx).await;

        if let Err(e) = self.memory.add_message(&session_id, "user", &request.prompt, serde_json::json!({})).await {
            tracing::warn!(error = %e, "failed to log user turn to session memory");
        }

        let outcome = self
            .executor
            .execute_plan(&plan, &request.prompt, session_id.as_str(), mode, &CancelHandle::new())
            .await;

        let response_text = render_response(&plan, &outcome.results, outcome.requires_confirmation);
        let mut memory_updated = true;
        if !outcome.results.is_empty() || !plan.reasoning.is_empty() {
            if let Err(e) =
                self.memory.add_message(&session_id, "assistant", &response_text, serde_json::json!({})).await
            {
                tracing::warn!(error = %e, "failed to log assistant turn to session memory");
                memory_updated = false;
            }
        }

        if !outcome.requires_confirmation {
            let report = self.run_autonomous_cycle(session_id.as_str()).await;
            tracing::debug!(?report, "autonomous cycle post-hook ran");
        }

        OrchestrateResponse {
            intention: intent_tag(intent).to_string(),
            confidence,
            plan: plan.steps,
            response: response_text,
            execution_results: outcome.results,
            requires_confirmation: outcome.requires_confirmation,
            execution_mode_used: mode_tag(mode).to_string(),
            memory_updated,
        }
    }
}

fn intent_tag(intent: Intent) -> &'static str {
    match intent {
        Intent::RulesQuery => "rules_query",
        Intent::ProjectQuery => "project_query",
        Intent::MemoryQuery => "memory_query",
        Intent::VisionAnalysis => "vision_analysis",
        Intent::AudioProcessing => "audio_processing",
        Intent::General => "general",
    }
}

fn mode_tag(mode: ExecutionMode) -> &'static str {
    match mode {
        ExecutionMode::Auto => "auto",
        ExecutionMode::PlanOnly => "plan_only",
        ExecutionMode::StepByStep => "step_by_step",
    }
}

fn render_response(plan: &Plan, results: &[ExecutionResult], requires_confirmation: bool) -> String {
    if requires_confirmation {
        return "This plan requires confirmation before it can run.".to_string();
    }
    if plan.steps.is_empty() && results.is_empty() {
        return plan.reasoning.clone();
    }
    if let Some(last) = results.last() {
        if last.status == kernel_core::StepStatus::Error {
            return format!(
                "The last step failed: {}",
                last.error_message.as_deref().unwrap_or("unknown error")
            );
        }
        if plan.steps.is_empty() {
            if let Some(text) = extract_generated_text(&last.data) {
                return text;
            }
        }
    }
    plan.reasoning.clone()
}

/// Pull a human-readable string out of an `llm.generate` result, trying
/// the conventional `text`/`response`/`content` keys before giving up.
fn extract_generated_text(data: &Option<serde_json::Value>) -> Option<String> {
    let value = data.as_ref()?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    for key in ["text", "response", "content"] {
        if let Some(s) = value.get(key).and_then(|v| v.as_str()) {
            return Some(s.to_string());
        }
    }
    None
}

/// Fan out `GET /health` to every registered Tool-Client: a
/// missing or unhealthy tool is reported, never treated as fatal.
pub async fn health_report(tools: &ToolClientRegistry) -> HashMap<String, bool> {
    tools.health_all().await.into_iter().map(|(tool, response)| (tool, response.ok)).collect()
}

/// Whether `kind` should be treated as unrecoverable storage corruption
/// for exit-code purposes, rather than a per-request error.
pub fn is_storage_corruption(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::Fatal)
}
