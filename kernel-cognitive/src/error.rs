//! Cognitive Engine errors.

use kernel_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Errors from a single [`crate::CognitiveEngine`] sub-operation.
///
/// These are surfaced in [`crate::CycleReport`] rather than propagated —
/// one sub-operation's failure must never block the others, so
/// `run_autonomous_cycle` itself cannot fail.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CognitiveError {
    /// The `llm` tool call failed or returned an unusable response.
    #[error("llm call failed: {0}")]
    Llm(String),

    /// The Timeline could not be read or written.
    #[error("timeline error: {0}")]
    Timeline(#[from] kernel_timeline::TimelineError),

    /// The RAG store could not be read or written.
    #[error("rag error: {0}")]
    Rag(#[from] kernel_rag::RagError),

    /// Session memory could not be read or written.
    #[error("memory error: {0}")]
    Memory(#[from] kernel_memory::MemoryError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HasErrorKind for CognitiveError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            CognitiveError::Llm(_) => ErrorKind::RemoteError,
            CognitiveError::Timeline(_) => ErrorKind::Fatal,
            CognitiveError::Rag(_) => ErrorKind::Fatal,
            CognitiveError::Memory(_) => ErrorKind::Fatal,
            CognitiveError::Other(_) => ErrorKind::Other,
        }
    }
}
