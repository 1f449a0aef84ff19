//! Planner errors.
//!
//! Never escapes [`crate::Planner::build_plan`] — every failure mode
//! here resolves to [`kernel_core::Plan::fallback`] instead. The type
//! exists so the fallback decision is logged with a reason.

use kernel_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Why the Planner fell back to [`kernel_core::Plan::fallback`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The `llm` tool-client call itself failed.
    #[error("llm call failed: {0}")]
    LlmUnavailable(String),

    /// The LLM's response was not valid JSON, or not shaped like a plan.
    #[error("could not parse planner output: {0}")]
    ParseFailure(String),

    /// A step in an otherwise-parseable plan failed catalog validation.
    #[error("invalid step: {0}")]
    InvalidStep(String),
}

impl HasErrorKind for PlannerError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            PlannerError::LlmUnavailable(_) => ErrorKind::RemoteError,
            PlannerError::ParseFailure(_) => ErrorKind::ParseError,
            PlannerError::InvalidStep(_) => ErrorKind::BadRequest,
        }
    }
}
