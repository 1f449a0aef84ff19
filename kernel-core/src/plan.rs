//! Plan / step / execution-result vocabulary shared by the Planner and
//! the Executor.

use crate::{catalog::PreferredLlm, duration::DurationMs, error::ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The sentinel argument value meaning "substitute the previous
/// successful step's result data here".
pub const PREVIOUS_SENTINEL: &str = "$previous";

/// One step of a [`Plan`]: one `(tool, action)` invocation with its arguments.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// The tool to invoke, e.g. `"files"`.
    pub tool: String,
    /// The action within that tool, e.g. `"read_file"`.
    pub action: String,
    /// Arguments for the action. A value may be the literal string
    /// [`PREVIOUS_SENTINEL`], meaning "substitute the previous step's result".
    #[serde(default)]
    pub args: HashMap<String, serde_json::Value>,
    /// Which model role this step prefers.
    #[serde(default)]
    pub preferred_llm: PreferredLlm,
    /// Whether independent execution is allowed for this step. Defaults to false (sequential).
    #[serde(default)]
    pub parallel_group: Option<u32>,
}

impl PlanStep {
    /// Construct a new step with default `preferred_llm` and no parallel group.
    pub fn new(tool: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            action: action.into(),
            args: HashMap::new(),
            preferred_llm: PreferredLlm::default(),
            parallel_group: None,
        }
    }

    /// Builder-style argument insertion.
    pub fn with_arg(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    /// Whether any argument value is the `$previous` sentinel.
    pub fn references_previous(&self) -> bool {
        self.args
            .values()
            .any(|v| v.as_str() == Some(PREVIOUS_SENTINEL))
    }
}

/// An ordered sequence of steps plus the Planner's free-form reasoning.
///
/// A plan of length zero is legal: it means "answer directly with the
/// reasoning LLM".
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// The ordered steps to execute.
    pub steps: Vec<PlanStep>,
    /// The Planner's free-form explanation of why this plan was chosen.
    #[serde(default)]
    pub reasoning: String,
}

impl Plan {
    /// The fallback plan used when the Planner's output can't be parsed
    /// or fails validation: a single `llm.generate` step over the
    /// original user message.
    pub fn fallback(user_message: &str) -> Self {
        Plan {
            steps: vec![PlanStep::new("llm", "generate")
                .with_arg("prompt", serde_json::Value::String(user_message.to_string()))],
            reasoning: "fallback: planner output was unusable".to_string(),
        }
    }

    /// Whether this is the empty "answer directly" plan.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// What execution mode the Executor should run a plan under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Run sequentially to completion, subject to sensitive-step gating.
    Auto,
    /// Return the plan without executing anything.
    PlanOnly,
    /// Execute exactly the next unexecuted step.
    StepByStep,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Auto
    }
}

/// Terminal status of one executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step's tool call succeeded.
    Success,
    /// The step's tool call failed (see `error_kind`).
    Error,
    /// The step was never attempted (e.g. plan aborted before reaching it).
    Skipped,
    /// The step was in flight or queued when the plan was cancelled.
    Cancelled,
}

/// The result of executing one [`PlanStep`].
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The step that was executed.
    pub step: PlanStep,
    /// Terminal status.
    pub status: StepStatus,
    /// The tool's raw result data, when `status == Success`.
    pub data: Option<serde_json::Value>,
    /// The normalized error kind, when `status == Error`.
    pub error_kind: Option<ErrorKind>,
    /// A short human-readable error message, when `status == Error`.
    pub error_message: Option<String>,
    /// Wall-clock time spent on this step, including retries.
    pub duration: DurationMs,
    /// Number of remote-call attempts made for this step.
    pub retry_count: u32,
}

impl ExecutionResult {
    /// Build a success result.
    pub fn success(step: PlanStep, data: serde_json::Value, duration: DurationMs, retry_count: u32) -> Self {
        Self {
            step,
            status: StepStatus::Success,
            data: Some(data),
            error_kind: None,
            error_message: None,
            duration,
            retry_count,
        }
    }

    /// Build an error result.
    pub fn error(
        step: PlanStep,
        kind: ErrorKind,
        message: impl Into<String>,
        duration: DurationMs,
        retry_count: u32,
    ) -> Self {
        Self {
            step,
            status: StepStatus::Error,
            data: None,
            error_kind: Some(kind),
            error_message: Some(message.into()),
            duration,
            retry_count,
        }
    }

    /// Build a skipped result (the step was never attempted).
    pub fn skipped(step: PlanStep) -> Self {
        Self {
            step,
            status: StepStatus::Skipped,
            data: None,
            error_kind: None,
            error_message: None,
            duration: DurationMs::ZERO,
            retry_count: 0,
        }
    }

    /// Build a cancelled result.
    pub fn cancelled(step: PlanStep, duration: DurationMs) -> Self {
        Self {
            step,
            status: StepStatus::Cancelled,
            data: None,
            error_kind: None,
            error_message: None,
            duration,
            retry_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_plan_is_single_llm_generate_step() {
        let plan = Plan::fallback("what time is it");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].tool, "llm");
        assert_eq!(plan.steps[0].action, "generate");
    }

    #[test]
    fn empty_plan_is_legal() {
        let plan = Plan::default();
        assert!(plan.is_empty());
    }

    #[test]
    fn detects_previous_sentinel() {
        let step = PlanStep::new("rag", "add_document")
            .with_arg("content", serde_json::Value::String(PREVIOUS_SENTINEL.to_string()));
        assert!(step.references_previous());

        let plain = PlanStep::new("rag", "query");
        assert!(!plain.references_previous());
    }
}
