//! Typed ID wrappers for session and document identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up session IDs, document IDs, etc.
/// These are just strings underneath — no UUID enforcement, no format
/// requirement.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(
    SessionId,
    "Sanitized identifier for a conversation session (alnum, dash, underscore only)."
);

impl SessionId {
    /// Sanitize a caller-supplied session id: keep `[A-Za-z0-9_-]`,
    /// replace every other character with `_`, and fall back to
    /// `"default"` if nothing survives. Used anywhere a session id
    /// crosses into a filesystem path or URL.
    pub fn sanitize(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        if cleaned.is_empty() {
            Self("default".to_string())
        } else {
            Self(cleaned)
        }
    }

    /// Whether this id marks a test session (prefix `test_`), per the
    /// session-memory layout rule.
    pub fn is_test_session(&self) -> bool {
        self.0.starts_with("test_")
    }
}
typed_id!(
    DocumentId,
    "Deterministic identifier for a document in the RAG store — a hash of dataset, filename, and a content prefix."
);

/// Monotonically increasing identifier for a Timeline event.
///
/// Unlike [`SessionId`]/[`DocumentId`], this is numeric: Timeline event
/// ordering is a correctness property, and a
/// `u64` sequence makes "is this strictly after that" a plain integer
/// comparison instead of a string one.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl EventId {
    /// The id before any event has been recorded.
    pub const ZERO: Self = Self(0);

    /// The next id in sequence.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_round_trips_through_string() {
        let id = SessionId::new("user-42");
        assert_eq!(id.as_str(), "user-42");
        assert_eq!(id.to_string(), "user-42");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        let id = SessionId::sanitize("user/../42 name");
        assert_eq!(id.as_str(), "user___42_name");
    }

    #[test]
    fn sanitize_empty_falls_back_to_default() {
        let id = SessionId::sanitize("///");
        assert_eq!(id.as_str(), "default");
    }

    #[test]
    fn test_session_prefix_is_detected() {
        assert!(SessionId::new("test_123").is_test_session());
        assert!(!SessionId::new("user-42").is_test_session());
    }

    #[test]
    fn event_id_increments() {
        let a = EventId::ZERO;
        let b = a.next();
        assert!(b > a);
        assert_eq!(b.0, 1);
    }
}
