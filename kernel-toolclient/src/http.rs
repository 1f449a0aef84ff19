//! HTTP transport for the Tool-Client contract, reached over loopback.

use crate::{TimeoutClass, ToolClient};
use async_trait::async_trait;
use kernel_core::{ErrorKind, ToolResponse};
use std::collections::HashMap;
use tracing::{instrument, warn};

/// A Tool-Client backed by a plain-HTTP tool service on loopback.
///
/// Requests go to `POST {base_url}/{tool}/{action}`; health checks go
/// to `GET {base_url}/health`. The tool name is fixed at construction —
/// one `HttpToolClient` per registered tool.
pub struct HttpToolClient {
    tool: String,
    base_url: String,
    http: reqwest::Client,
}

impl HttpToolClient {
    /// Build a client for `tool`, using the timeout class [`TimeoutClass::for_tool`] assigns it.
    pub fn new(tool: impl Into<String>, base_url: impl Into<String>) -> Self {
        let tool = tool.into();
        let timeout = TimeoutClass::for_tool(&tool).duration();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            tool,
            base_url: base_url.into(),
            http,
        }
    }
}

#[async_trait]
impl ToolClient for HttpToolClient {
    #[instrument(skip(self, args), fields(tool = %self.tool, action = %action))]
    async fn call(&self, action: &str, args: HashMap<String, serde_json::Value>) -> ToolResponse {
        let url = format!("{}/{}/{}", self.base_url.trim_end_matches('/'), self.tool, action);

        let response = match self.http.post(&url).json(&args).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!(error = %e, "tool call timed out");
                return ToolResponse::err(action, ErrorKind::Timeout, e.to_string());
            }
            Err(e) => {
                warn!(error = %e, "tool call transport failure");
                return ToolResponse::err(action, ErrorKind::Transport, e.to_string());
            }
        };

        if response.status().is_server_error() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "remote error".to_string());
            return ToolResponse::err(action, ErrorKind::RemoteError, message);
        }

        if response.status().is_client_error() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "bad request".to_string());
            return ToolResponse::err(action, ErrorKind::BadRequest, message);
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => ToolResponse::ok(action, body),
            Err(e) => ToolResponse::err(action, ErrorKind::RemoteError, format!("invalid response body: {e}")),
        }
    }

    #[instrument(skip(self), fields(tool = %self.tool))]
    async fn health(&self) -> ToolResponse {
        let url = format!("{}/health", self.base_url.trim_end_matches('/'));
        match self.http.get(&url).send().await {
            Ok(r) if r.status().is_success() => {
                let body = r.json::<serde_json::Value>().await.unwrap_or(serde_json::json!({}));
                ToolResponse::ok("health", body)
            }
            Ok(r) => ToolResponse::err("health", ErrorKind::RemoteError, format!("status {}", r.status())),
            Err(e) if e.is_timeout() => ToolResponse::err("health", ErrorKind::Timeout, e.to_string()),
            Err(e) => ToolResponse::err("health", ErrorKind::Transport, e.to_string()),
        }
    }
}
