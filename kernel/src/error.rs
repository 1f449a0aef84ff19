//! Kernel facade errors and the process exit codes they map to.

use kernel_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Errors from the kernel facade itself (as opposed to a sub-crate's
/// own error type, which is wrapped here).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KernelError {
    /// The configuration file was missing, malformed, or incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A storage backend reported corruption rather than a transient failure.
    #[error("storage corruption: {0}")]
    StorageCorruption(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HasErrorKind for KernelError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            KernelError::Config(_) => ErrorKind::BadRequest,
            KernelError::StorageCorruption(_) => ErrorKind::Fatal,
            KernelError::Other(_) => ErrorKind::Other,
        }
    }
}

/// The process exit code a top-level [`KernelError`] maps to:
/// 0 clean shutdown, 1 fatal configuration error, 2 unrecoverable storage corruption.
pub fn exit_code(error: &KernelError) -> i32 {
    match error {
        KernelError::Config(_) => 1,
        KernelError::StorageCorruption(_) => 2,
        KernelError::Other(_) => 1,
    }
}
