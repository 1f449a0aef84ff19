//! # kernel-toolclient — the Tool-Client contract
//!
//! Every tool in the fleet — files, memory, rag, vision, search, system,
//! control, audio, documents, llm — is reached through a uniform
//! [`ToolClient`]: one async method per `(tool, action)` pair, always
//! returning a normalized [`ToolResponse`], never panicking and never
//! propagating a raw transport error.
//!
//! [`HttpToolClient`] is the reference transport: plain HTTP over
//! loopback, `POST /<tool>/<action>` with a JSON body, `GET /health`
//! for liveness. [`ToolClientRegistry`] is the static `tool -> client`
//! map the Executor and Context Builder dispatch through.

#![deny(missing_docs)]

mod http;
mod registry;

pub use http::HttpToolClient;
pub use registry::ToolClientRegistry;

use async_trait::async_trait;
use kernel_core::ToolResponse;
use std::collections::HashMap;
use std::time::Duration;

/// Timeout class an action falls into: short (30s default),
/// LLM-generation (120s), or vision (60s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    /// The 30s default applied to most tool calls.
    Short,
    /// The 120s ceiling applied to `llm.*` actions.
    LlmGeneration,
    /// The 60s ceiling applied to `vision.*` actions.
    Vision,
}

impl TimeoutClass {
    /// Classify a tool name into its timeout class.
    pub fn for_tool(tool: &str) -> Self {
        match tool {
            "llm" => TimeoutClass::LlmGeneration,
            "vision" => TimeoutClass::Vision,
            _ => TimeoutClass::Short,
        }
    }

    /// The concrete deadline for this class.
    pub fn duration(self) -> Duration {
        match self {
            TimeoutClass::Short => Duration::from_secs(30),
            TimeoutClass::LlmGeneration => Duration::from_secs(120),
            TimeoutClass::Vision => Duration::from_secs(60),
        }
    }
}

/// One tool service reachable over the Tool-Client contract.
///
/// Implementations never return `Err` from `call` for a remote/transport
/// failure — they normalize it into `ToolResponse { ok: false, .. }` so
/// the Executor has one shape to reason about regardless of what went
/// wrong. `call` is object-safe so a [`ToolClientRegistry`] can hold a
/// heterogeneous set of clients behind `Arc<dyn ToolClient>`.
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Invoke `action` with `args`, returning a normalized response.
    async fn call(&self, action: &str, args: HashMap<String, serde_json::Value>) -> ToolResponse;

    /// Liveness/readiness check for this tool service.
    async fn health(&self) -> ToolResponse;
}
