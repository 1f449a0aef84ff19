//! Executor errors.
//!
//! These never reach a plan's `execution_results` — step failures are
//! carried as data on [`kernel_core::ExecutionResult`]. This type
//! exists for genuinely exceptional conditions, like the Timeline
//! itself being unreachable while logging a step.

use kernel_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Errors raised by the Executor's own infrastructure, distinct from a
/// dispatched step's failure.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The Timeline could not record an event.
    #[error("timeline error: {0}")]
    Timeline(#[from] kernel_timeline::TimelineError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HasErrorKind for ExecutorError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            ExecutorError::Timeline(_) => ErrorKind::Fatal,
            ExecutorError::Other(_) => ErrorKind::Other,
        }
    }
}
