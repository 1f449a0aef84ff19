//! The Planner: turns `(user_message, SuperContext)` into a [`Plan`].

use crate::error::PlannerError;
use crate::{parse, prompt, summary};
use kernel_context::SuperContext;
use kernel_core::Plan;
use kernel_toolclient::ToolClientRegistry;
use std::collections::HashMap;
use std::sync::Arc;

/// Produces plans by asking the `llm` Tool-Client to choose tool steps.
///
/// Holds no direct provider integration — every LLM call goes through
/// the `llm` Tool-Client like any other tool.
pub struct Planner {
    tools: Arc<ToolClientRegistry>,
}

impl Planner {
    /// Build a Planner dispatching through `tools`.
    pub fn new(tools: Arc<ToolClientRegistry>) -> Self {
        Self { tools }
    }

    /// Build a plan for `user_message` given the assembled `ctx`.
    ///
    /// Never fails outward: any internal [`PlannerError`] resolves to
    /// [`Plan::fallback`] instead.
    pub async fn build_plan(&self, user_message: &str, ctx: &SuperContext) -> Plan {
        match self.try_build_plan(user_message, ctx).await {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!(error = %err, "planner falling back to default plan");
                Plan::fallback(user_message)
            }
        }
    }

    async fn try_build_plan(&self, user_message: &str, ctx: &SuperContext) -> Result<Plan, PlannerError> {
        let context_summary = summary::summarize(ctx);
        let prompt_text = prompt::build_prompt(user_message, &context_summary);

        let mut args = HashMap::new();
        args.insert("prompt".to_string(), serde_json::Value::String(prompt_text));

        let response = self.tools.call("llm", "generate", args).await;
        if !response.ok {
            return Err(PlannerError::LlmUnavailable(
                response.error_message.unwrap_or_else(|| "llm tool-client returned no message".to_string()),
            ));
        }

        let raw_text = response
            .data
            .as_ref()
            .and_then(|v| v.get("text").and_then(|t| t.as_str()).or_else(|| v.as_str()))
            .ok_or_else(|| PlannerError::ParseFailure("llm response had no text field".to_string()))?;

        parse::parse_plan(raw_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kernel_context::{SourceOutcome, SuperContextMetadata};
    use kernel_core::ToolResponse;
    use kernel_toolclient::ToolClient;
    use std::collections::BTreeMap;

    fn empty_context() -> SuperContext {
        SuperContext {
            memory_context: SourceOutcome::Ok { data: String::new() },
            memory_search: SourceOutcome::Ok { data: vec![] },
            rag: BTreeMap::new(),
            vision: None,
            audio: None,
            system: None,
            metadata: SuperContextMetadata { sources_available: vec![], total_context_size: 0 },
        }
    }

    struct StubLlm {
        text: String,
    }

    #[async_trait]
    impl ToolClient for StubLlm {
        async fn call(&self, action: &str, _args: HashMap<String, serde_json::Value>) -> ToolResponse {
            ToolResponse::ok(action, serde_json::json!({"text": self.text}))
        }

        async fn health(&self) -> ToolResponse {
            ToolResponse::ok("health", serde_json::json!({"status": "ok"}))
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl ToolClient for FailingLlm {
        async fn call(&self, action: &str, _args: HashMap<String, serde_json::Value>) -> ToolResponse {
            ToolResponse::err(action, kernel_core::ErrorKind::RemoteError, "down")
        }

        async fn health(&self) -> ToolResponse {
            ToolResponse::err("health", kernel_core::ErrorKind::RemoteError, "down")
        }
    }

    #[tokio::test]
    async fn builds_plan_from_well_formed_llm_response() {
        let mut registry = ToolClientRegistry::new();
        registry.register(
            "llm",
            Arc::new(StubLlm {
                text: r#"{"steps":[{"tool":"files","action":"read_file","args":{"path":"a.txt"}}],"reasoning":"reading"}"#
                    .to_string(),
            }),
        );
        let planner = Planner::new(Arc::new(registry));
        let plan = planner.build_plan("read a.txt", &empty_context()).await;
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].tool, "files");
    }

    #[tokio::test]
    async fn falls_back_when_llm_tool_fails() {
        let mut registry = ToolClientRegistry::new();
        registry.register("llm", Arc::new(FailingLlm));
        let planner = Planner::new(Arc::new(registry));
        let plan = planner.build_plan("hello", &empty_context()).await;
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].action, "generate");
    }

    #[tokio::test]
    async fn falls_back_on_unparseable_response() {
        let mut registry = ToolClientRegistry::new();
        registry.register("llm", Arc::new(StubLlm { text: "not json at all".to_string() }));
        let planner = Planner::new(Arc::new(registry));
        let plan = planner.build_plan("hello", &empty_context()).await;
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].action, "generate");
    }

    #[tokio::test]
    async fn empty_steps_is_a_legal_plan() {
        let mut registry = ToolClientRegistry::new();
        registry.register(
            "llm",
            Arc::new(StubLlm { text: r#"{"steps":[],"reasoning":"answering directly"}"#.to_string() }),
        );
        let planner = Planner::new(Arc::new(registry));
        let plan = planner.build_plan("hello", &empty_context()).await;
        assert!(plan.is_empty());
    }
}
