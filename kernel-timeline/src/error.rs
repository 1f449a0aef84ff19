//! Timeline errors.

use kernel_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Errors from a [`crate::Timeline`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TimelineError {
    /// An underlying storage operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HasErrorKind for TimelineError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            TimelineError::Storage(_) => ErrorKind::Fatal,
            TimelineError::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<rusqlite::Error> for TimelineError {
    fn from(e: rusqlite::Error) -> Self {
        TimelineError::Storage(e.to_string())
    }
}
