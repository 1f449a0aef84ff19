//! The Executor: dispatches a [`Plan`]'s steps one mode at a time.

use crate::cancel::CancelHandle;
use crate::retry::call_with_retry;
use crate::substitute::resolve_args;
use kernel_core::{DurationMs, ErrorKind, ExecutionMode, ExecutionResult, Plan, PlanStep, CATALOG};
use kernel_timeline::Timeline;
use kernel_toolclient::ToolClientRegistry;
use std::sync::Arc;
use std::time::Instant;

/// The outcome of one `execute_plan` call.
#[derive(Debug, Clone)]
pub struct ExecuteOutcome {
    /// Results for every step that was actually attempted.
    pub results: Vec<ExecutionResult>,
    /// Whether the caller must confirm before this plan (or its
    /// remaining tail, in `step_by_step` mode) can run.
    pub requires_confirmation: bool,
    /// The steps not yet executed (non-empty only for `step_by_step`,
    /// or when a plan was refused/cancelled before completion).
    pub remaining: Vec<PlanStep>,
}

/// Whether any step in `steps` is sensitive: performs a write or
/// other external side effect, per the catalog's `sensitive` flag.
fn has_sensitive_step(steps: &[PlanStep]) -> bool {
    steps
        .iter()
        .any(|s| CATALOG.action(&s.tool, &s.action).map(|spec| spec.sensitive).unwrap_or(false))
}

/// Dispatches plan steps against a [`ToolClientRegistry`], logging each
/// step's lifecycle to a [`Timeline`].
pub struct Executor {
    tools: Arc<ToolClientRegistry>,
    timeline: Option<Arc<Timeline>>,
}

impl Executor {
    /// Build an Executor dispatching through `tools`, optionally
    /// logging step lifecycle events to `timeline`.
    pub fn new(tools: Arc<ToolClientRegistry>, timeline: Option<Arc<Timeline>>) -> Self {
        Self { tools, timeline }
    }

    fn log(&self, session_id: &str, event_type: &str, data: serde_json::Value) {
        if let Some(timeline) = &self.timeline {
            if let Err(err) = timeline.append(session_id, event_type, data, serde_json::json!({}), None) {
                tracing::warn!(error = %err, event_type, "failed to log timeline event");
            }
        }
    }

    /// Execute `plan` for `session_id` under `mode`, honoring `cancel`.
    ///
    /// A plan of length zero is the Planner's legal "answer directly"
    /// result; this synthesizes the same single `llm.generate` fallback
    /// step [`Plan::fallback`] builds for unparseable Planner output,
    /// over `user_message`, and executes that instead of a no-op.
    pub async fn execute_plan(
        &self,
        plan: &Plan,
        user_message: &str,
        session_id: &str,
        mode: ExecutionMode,
        cancel: &CancelHandle,
    ) -> ExecuteOutcome {
        let synthesized;
        let plan = if plan.steps.is_empty() {
            synthesized = Plan::fallback(user_message);
            &synthesized
        } else {
            plan
        };

        match mode {
            ExecutionMode::PlanOnly => ExecuteOutcome {
                results: Vec::new(),
                requires_confirmation: true,
                remaining: plan.steps.clone(),
            },
            ExecutionMode::Auto => self.execute_auto(plan, session_id, cancel).await,
            ExecutionMode::StepByStep => self.execute_one(plan, session_id, cancel).await,
        }
    }

    async fn execute_auto(&self, plan: &Plan, session_id: &str, cancel: &CancelHandle) -> ExecuteOutcome {
        if plan.steps.len() > 1 || has_sensitive_step(&plan.steps) {
            return ExecuteOutcome {
                results: Vec::new(),
                requires_confirmation: true,
                remaining: plan.steps.clone(),
            };
        }

        let results = self.run_steps(&plan.steps, session_id, cancel).await;
        ExecuteOutcome {
            results,
            requires_confirmation: false,
            remaining: Vec::new(),
        }
    }

    async fn execute_one(&self, plan: &Plan, session_id: &str, cancel: &CancelHandle) -> ExecuteOutcome {
        let Some((first, rest)) = plan.steps.split_first() else {
            return ExecuteOutcome { results: Vec::new(), requires_confirmation: false, remaining: Vec::new() };
        };
        let results = self.run_steps(std::slice::from_ref(first), session_id, cancel).await;
        ExecuteOutcome {
            results,
            requires_confirmation: false,
            remaining: rest.to_vec(),
        }
    }

    /// Run `steps` to completion, honoring parallel groups, `$previous`
    /// substitution, and cancellation. Steps are batched into runs of
    /// consecutive entries sharing the same `parallel_group`; a step
    /// that references `$previous` is always run in its own sequential
    /// batch, since `$previous` is undefined across parallel peers.
    async fn run_steps(
        &self,
        steps: &[PlanStep],
        session_id: &str,
        cancel: &CancelHandle,
    ) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(steps.len());
        let mut previous: Option<serde_json::Value> = None;
        let mut index = 0;

        while index < steps.len() {
            if cancel.is_cancelled() {
                let mut remaining = steps[index..].iter();
                if let Some(in_flight) = remaining.next() {
                    results.push(ExecutionResult::cancelled(in_flight.clone(), DurationMs::ZERO));
                }
                for step in remaining {
                    results.push(ExecutionResult::skipped(step.clone()));
                }
                break;
            }

            let batch_end = batch_end(steps, index);
            let batch_start_len = results.len();
            if batch_end - index > 1 {
                let batch = &steps[index..batch_end];
                let mut handles = Vec::with_capacity(batch.len());
                for step in batch {
                    let step = step.clone();
                    let tools = Arc::clone(&self.tools);
                    let session_id = session_id.to_string();
                    let args = resolve_args(&step, previous.as_ref());
                    handles.push(tokio::spawn(run_one_step(tools, step, session_id, args)));
                }
                for (step, handle) in batch.iter().zip(handles) {
                    let (result, log_events) = match handle.await {
                        Ok(pair) => pair,
                        Err(join_err) => (
                            ExecutionResult::error(step.clone(), ErrorKind::Fatal, join_err.to_string(), DurationMs::ZERO, 0),
                            Vec::new(),
                        ),
                    };
                    for (event_type, data) in log_events {
                        self.log(session_id, &event_type, data);
                    }
                    if result.status == kernel_core::StepStatus::Success {
                        previous = result.data.clone();
                    }
                    results.push(result);
                }
            } else {
                let step = &steps[index];
                let args = resolve_args(step, previous.as_ref());
                let (result, log_events) = run_one_step(
                    Arc::clone(&self.tools),
                    step.clone(),
                    session_id.to_string(),
                    args,
                )
                .await;
                for (event_type, data) in log_events {
                    self.log(session_id, &event_type, data);
                }
                if result.status == kernel_core::StepStatus::Success {
                    previous = result.data.clone();
                }
                results.push(result);
            }

            let halted_on_unknown_action = results[batch_start_len..]
                .iter()
                .any(|r| r.error_kind == Some(ErrorKind::UnknownAction));

            index = batch_end;

            if halted_on_unknown_action {
                break;
            }
        }

        results
    }
}

/// Find the end (exclusive) of the batch starting at `start`: either a
/// run of consecutive steps sharing the same `Some(group)`, or a
/// singleton. A step referencing `$previous` always starts and ends
/// its own singleton batch.
fn batch_end(steps: &[PlanStep], start: usize) -> usize {
    if steps[start].references_previous() {
        return start + 1;
    }
    let Some(group) = steps[start].parallel_group else {
        return start + 1;
    };
    let mut end = start + 1;
    while end < steps.len()
        && steps[end].parallel_group == Some(group)
        && !steps[end].references_previous()
    {
        end += 1;
    }
    end
}

/// Dispatch one step: resolve `$previous`, call the registry with
/// retry, and build the `step_start`/`step_end`/`step_error` Timeline
/// events the caller should log (logging itself is deferred to the
/// caller so this function stays free of `&self` borrows under `tokio::spawn`).
async fn run_one_step(
    tools: Arc<ToolClientRegistry>,
    step: PlanStep,
    _session_id: String,
    args: Option<std::collections::HashMap<String, serde_json::Value>>,
) -> (ExecutionResult, Vec<(String, serde_json::Value)>) {
    let mut events = Vec::new();
    events.push((
        "step_start".to_string(),
        serde_json::json!({"tool": step.tool, "action": step.action, "args": step.args}),
    ));

    let Some(args) = args else {
        let result = ExecutionResult::error(
            step.clone(),
            ErrorKind::MissingPrevious,
            "$previous referenced but no prior successful step",
            DurationMs::ZERO,
            0,
        );
        events.push((
            "step_error".to_string(),
            serde_json::json!({
                "tool": step.tool, "action": step.action,
                "error_kind": "missing_previous",
                "message_excerpt": "no prior successful step",
            }),
        ));
        return (result, events);
    };

    if CATALOG.action(&step.tool, &step.action).is_none() {
        let result = ExecutionResult::error(
            step.clone(),
            ErrorKind::UnknownAction,
            format!("no such action: {}.{}", step.tool, step.action),
            DurationMs::ZERO,
            0,
        );
        events.push((
            "step_error".to_string(),
            serde_json::json!({
                "tool": step.tool, "action": step.action,
                "error_kind": "unknown_action",
                "message_excerpt": "no such action",
            }),
        ));
        return (result, events);
    }

    let start = Instant::now();
    let (response, attempts) = call_with_retry(&tools, &step.tool, &step.action, args).await;
    let duration = DurationMs::from(start.elapsed());

    let result = if response.ok {
        ExecutionResult::success(step.clone(), response.data.unwrap_or(serde_json::Value::Null), duration, attempts)
    } else {
        let kind = response.error_kind.unwrap_or(ErrorKind::Other);
        let message = response.error_message.unwrap_or_default();
        if kind != ErrorKind::UnknownAction {
            events.push((
                "step_error".to_string(),
                serde_json::json!({
                    "tool": step.tool, "action": step.action,
                    "error_kind": kind.to_string(),
                    "message_excerpt": message.chars().take(200).collect::<String>(),
                }),
            ));
        }
        ExecutionResult::error(step.clone(), kind, message, duration, attempts)
    };

    events.push((
        "step_end".to_string(),
        serde_json::json!({
            "status": if result.status == kernel_core::StepStatus::Success { "success" } else { "error" },
            "duration_ms": duration.as_millis(),
            "attempts": attempts,
        }),
    ));

    (result, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kernel_core::{PlanStep, StepStatus, ToolResponse};
    use kernel_toolclient::ToolClient;
    use std::collections::HashMap;

    struct EchoClient;

    #[async_trait]
    impl ToolClient for EchoClient {
        async fn call(&self, action: &str, args: HashMap<String, serde_json::Value>) -> ToolResponse {
            ToolResponse::ok(action, serde_json::json!(args))
        }

        async fn health(&self) -> ToolResponse {
            ToolResponse::ok("health", serde_json::json!({"status": "ok"}))
        }
    }

    fn registry_with_echo() -> Arc<ToolClientRegistry> {
        let mut registry = ToolClientRegistry::new();
        registry.register("files", Arc::new(EchoClient));
        registry.register("rag", Arc::new(EchoClient));
        registry.register("llm", Arc::new(EchoClient));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn single_safe_step_runs_directly_in_auto_mode() {
        let executor = Executor::new(registry_with_echo(), None);
        let plan = Plan {
            steps: vec![PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("a.txt"))],
            reasoning: String::new(),
        };
        let outcome = executor.execute_plan(&plan, "hi", "s1", ExecutionMode::Auto, &CancelHandle::new()).await;
        assert!(!outcome.requires_confirmation);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].status, StepStatus::Success);
    }

    #[tokio::test]
    async fn multi_step_plan_requires_confirmation_in_auto_mode() {
        let executor = Executor::new(registry_with_echo(), None);
        let plan = Plan {
            steps: vec![
                PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("a.txt")),
                PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("b.txt")),
            ],
            reasoning: String::new(),
        };
        let outcome = executor.execute_plan(&plan, "hi", "s1", ExecutionMode::Auto, &CancelHandle::new()).await;
        assert!(outcome.requires_confirmation);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn sensitive_single_step_requires_confirmation() {
        let executor = Executor::new(registry_with_echo(), None);
        let plan = Plan {
            steps: vec![PlanStep::new("files", "delete_file").with_arg("path", serde_json::json!("a.txt"))],
            reasoning: String::new(),
        };
        let outcome = executor.execute_plan(&plan, "hi", "s1", ExecutionMode::Auto, &CancelHandle::new()).await;
        assert!(outcome.requires_confirmation);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn plan_only_never_executes() {
        let executor = Executor::new(registry_with_echo(), None);
        let plan = Plan {
            steps: vec![PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("a.txt"))],
            reasoning: String::new(),
        };
        let outcome = executor.execute_plan(&plan, "hi", "s1", ExecutionMode::PlanOnly, &CancelHandle::new()).await;
        assert!(outcome.requires_confirmation);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.remaining.len(), 1);
    }

    #[tokio::test]
    async fn step_by_step_executes_exactly_one_step() {
        let executor = Executor::new(registry_with_echo(), None);
        let plan = Plan {
            steps: vec![
                PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("a.txt")),
                PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("b.txt")),
            ],
            reasoning: String::new(),
        };
        let outcome = executor.execute_plan(&plan, "hi", "s1", ExecutionMode::StepByStep, &CancelHandle::new()).await;
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.remaining.len(), 1);
    }

    #[tokio::test]
    async fn empty_plan_synthesizes_and_runs_the_fallback_step() {
        let executor = Executor::new(registry_with_echo(), None);
        let plan = Plan { steps: Vec::new(), reasoning: "answering directly".to_string() };
        let outcome = executor.execute_plan(&plan, "what's the weather", "s1", ExecutionMode::Auto, &CancelHandle::new()).await;
        assert!(!outcome.requires_confirmation);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].status, StepStatus::Success);
        assert_eq!(outcome.results[0].step.tool, "llm");
        assert_eq!(outcome.results[0].step.action, "generate");
    }

    #[tokio::test]
    async fn missing_previous_without_a_predecessor_errors() {
        let executor = Executor::new(registry_with_echo(), None);
        let step = PlanStep::new("rag", "add_document")
            .with_arg("dataset", serde_json::json!("scratchpad"))
            .with_arg("filename", serde_json::json!("a.txt"))
            .with_arg("content", serde_json::json!("$previous"));
        let results = executor.run_steps(std::slice::from_ref(&step), "s1", &CancelHandle::new()).await;
        assert_eq!(results[0].status, StepStatus::Error);
        assert_eq!(results[0].error_kind, Some(ErrorKind::MissingPrevious));
    }

    #[tokio::test]
    async fn cancellation_marks_remaining_steps_cancelled() {
        let executor = Executor::new(registry_with_echo(), None);
        let cancel = CancelHandle::new();
        cancel.cancel();
        let steps = vec![
            PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("a.txt")),
            PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("b.txt")),
        ];
        let results = executor.run_steps(&steps, "s1", &cancel).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, StepStatus::Cancelled);
        assert_eq!(results[1].status, StepStatus::Skipped);
    }

    #[tokio::test]
    async fn unknown_action_halts_remaining_steps() {
        let executor = Executor::new(registry_with_echo(), None);
        let steps = vec![
            PlanStep::new("files", "not_a_real_action").with_arg("path", serde_json::json!("a.txt")),
            PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("b.txt")),
        ];
        let results = executor.run_steps(&steps, "s1", &CancelHandle::new()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, StepStatus::Error);
        assert_eq!(results[0].error_kind, Some(ErrorKind::UnknownAction));
    }

    #[tokio::test]
    async fn parallel_group_runs_concurrently_and_preserves_order() {
        let executor = Executor::new(registry_with_echo(), None);
        let mut a = PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("a.txt"));
        a.parallel_group = Some(1);
        let mut b = PlanStep::new("files", "read_file").with_arg("path", serde_json::json!("b.txt"));
        b.parallel_group = Some(1);
        let results = executor.run_steps(&[a, b], "s1", &CancelHandle::new()).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].step.args["path"], serde_json::json!("a.txt"));
        assert_eq!(results[1].step.args["path"], serde_json::json!("b.txt"));
    }
}
