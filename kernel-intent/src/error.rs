//! Intent router errors.
//!
//! Classification and sensitive-step tagging are both total functions —
//! this enum exists for symmetry with the rest of the kernel's ambient
//! error-handling stack and for any future policy that can fail.

use kernel_core::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Errors from the intent router.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum IntentError {
    /// Catch-all for policy implementations that need to report failure.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HasErrorKind for IntentError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            IntentError::Other(_) => ErrorKind::Other,
        }
    }
}
