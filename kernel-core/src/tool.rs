//! The normalized wire shapes every Tool-Client call produces.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The request body posted to `POST /<tool>/<action>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Arguments for the action, matching the catalog's declared parameters.
    #[serde(flatten)]
    pub args: HashMap<String, serde_json::Value>,
}

impl ToolRequest {
    /// Build a request from an argument map.
    pub fn new(args: HashMap<String, serde_json::Value>) -> Self {
        Self { args }
    }
}

/// The normalized response every Tool-Client call produces, whether or
/// not the remote call succeeded. A Tool-Client method never panics or
/// propagates a transport error directly — it always produces one of these.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Whether the action succeeded.
    pub ok: bool,
    /// The action's result payload, present when `ok`.
    pub data: Option<serde_json::Value>,
    /// The normalized error kind, present when `!ok`.
    pub error_kind: Option<ErrorKind>,
    /// A short human-readable error message, present when `!ok`.
    pub error_message: Option<String>,
    /// Echo of the action name this response is for.
    pub action: String,
}

impl ToolResponse {
    /// Build a success response.
    pub fn ok(action: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error_kind: None,
            error_message: None,
            action: action.into(),
        }
    }

    /// Build a failure response.
    pub fn err(action: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error_kind: Some(kind),
            error_message: Some(message.into()),
            action: action.into(),
        }
    }
}
