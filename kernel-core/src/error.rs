//! The shared error-kind taxonomy every subsystem normalizes onto.

use serde::{Deserialize, Serialize};

/// The wire-level error taxonomy every subsystem normalizes onto.
///
/// Each crate defines its own `thiserror`-derived error enum scoped to
/// its own concern, and implements [`HasErrorKind`] to map onto this
/// shared vocabulary — this is what lets the Executor apply one retry
/// policy regardless of which tool or subsystem produced the
/// failure.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Could not reach the tool service at all.
    Transport,
    /// The tool did not answer within its deadline.
    Timeout,
    /// The tool answered with a 5xx-class failure.
    RemoteError,
    /// Argument schema violation, detected by the tool or by kernel-side validation.
    BadRequest,
    /// No such `(tool, action)` pair in the catalog.
    UnknownAction,
    /// A sensitive step was attempted without confirmation.
    PermissionDenied,
    /// A step referenced `$previous` but no prior step succeeded.
    MissingPrevious,
    /// The embedder could not produce a vector.
    EmbeddingUnavailable,
    /// Planner output could not be interpreted as a plan.
    ParseError,
    /// Unrecoverable failure (e.g. storage corruption).
    Fatal,
    /// Anything not covered above.
    Other,
}

impl ErrorKind {
    /// Whether the Executor's retry policy should retry a step that failed with this kind.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::Transport | ErrorKind::Timeout | ErrorKind::RemoteError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RemoteError => "remote_error",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::UnknownAction => "unknown_action",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::MissingPrevious => "missing_previous",
            ErrorKind::EmbeddingUnavailable => "embedding_unavailable",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::Fatal => "fatal",
            ErrorKind::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Implemented by every subsystem error enum so callers can normalize
/// onto the shared [`ErrorKind`] taxonomy without matching on each
/// crate's concrete error type.
pub trait HasErrorKind {
    /// The wire-level kind this error maps onto.
    fn error_kind(&self) -> ErrorKind;
}
