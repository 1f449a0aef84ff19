//! RAG store errors.

use kernel_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Errors from [`crate::store::RagStore`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedder refused to produce a vector.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The requested document does not exist.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// An underlying storage operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HasErrorKind for RagError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            RagError::EmbeddingUnavailable(_) => ErrorKind::EmbeddingUnavailable,
            RagError::DocumentNotFound(_) => ErrorKind::BadRequest,
            RagError::Storage(_) => ErrorKind::Fatal,
            RagError::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<rusqlite::Error> for RagError {
    fn from(e: rusqlite::Error) -> Self {
        RagError::Storage(e.to_string())
    }
}

impl From<crate::embedder::EmbeddingError> for RagError {
    fn from(e: crate::embedder::EmbeddingError) -> Self {
        match e {
            crate::embedder::EmbeddingError::Unavailable(msg) => RagError::EmbeddingUnavailable(msg),
        }
    }
}
