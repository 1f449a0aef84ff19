//! The static `tool -> client` map the Executor and Context Builder dispatch through.

use crate::ToolClient;
use kernel_core::{ErrorKind, ToolResponse, CATALOG};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps tool names onto their [`ToolClient`]. Immutable after construction.
#[derive(Clone, Default)]
pub struct ToolClientRegistry {
    clients: HashMap<String, Arc<dyn ToolClient>>,
}

impl ToolClientRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client for `tool`, replacing any prior registration.
    pub fn register(&mut self, tool: impl Into<String>, client: Arc<dyn ToolClient>) {
        self.clients.insert(tool.into(), client);
    }

    /// Look up the client registered for `tool`, if any.
    pub fn get(&self, tool: &str) -> Option<&Arc<dyn ToolClient>> {
        self.clients.get(tool)
    }

    /// Dispatch `(tool, action)` with `args`, normalizing an unknown tool
    /// or action into `ErrorKind::UnknownAction` instead of panicking —
    /// callers (the Executor) never need a separate "tool missing" path.
    pub async fn call(
        &self,
        tool: &str,
        action: &str,
        args: HashMap<String, serde_json::Value>,
    ) -> ToolResponse {
        if CATALOG.action(tool, action).is_none() {
            return ToolResponse::err(
                action,
                ErrorKind::UnknownAction,
                format!("no such action: {tool}.{action}"),
            );
        }
        match self.clients.get(tool) {
            Some(client) => client.call(action, args).await,
            None => ToolResponse::err(
                action,
                ErrorKind::UnknownAction,
                format!("no client registered for tool: {tool}"),
            ),
        }
    }

    /// Fan out `/health` to every registered client, aggregated by tool name.
    pub async fn health_all(&self) -> HashMap<String, ToolResponse> {
        let mut out = HashMap::with_capacity(self.clients.len());
        for (tool, client) in &self.clients {
            out.insert(tool.clone(), client.health().await);
        }
        out
    }

    /// Every registered tool name.
    pub fn registered_tools(&self) -> Vec<&str> {
        self.clients.keys().map(|s| s.as_str()).collect()
    }
}
