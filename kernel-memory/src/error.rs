//! Session memory errors.

use kernel_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Errors from a [`crate::MemoryStore`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The named session has no messages.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A filesystem operation failed.
    #[error("io error: {0}")]
    Io(String),

    /// A stored session file could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HasErrorKind for MemoryError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            MemoryError::SessionNotFound(_) => ErrorKind::BadRequest,
            MemoryError::Io(_) => ErrorKind::Fatal,
            MemoryError::Serialization(_) => ErrorKind::ParseError,
            MemoryError::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<std::io::Error> for MemoryError {
    fn from(e: std::io::Error) -> Self {
        MemoryError::Io(e.to_string())
    }
}
