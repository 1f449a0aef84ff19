//! Retry with exponential backoff for retriable step failures.

use kernel_core::ToolResponse;
use kernel_toolclient::ToolClientRegistry;
use std::collections::HashMap;
use std::time::Duration;

/// Backoff delays between attempts, applied after a retriable failure.
pub const BACKOFF: [Duration; 3] = [
    Duration::from_millis(100),
    Duration::from_millis(400),
    Duration::from_millis(1_600),
];

/// Maximum number of remote-call attempts per step.
pub const MAX_ATTEMPTS: u32 = 3;

/// Dispatch `(tool, action, args)` through `registry`, retrying up to
/// [`MAX_ATTEMPTS`] times with exponential backoff when the failure's
/// error kind is retriable. Returns the final response and the number
/// of attempts made.
pub async fn call_with_retry(
    registry: &ToolClientRegistry,
    tool: &str,
    action: &str,
    args: HashMap<String, serde_json::Value>,
) -> (ToolResponse, u32) {
    let mut attempt = 1;
    loop {
        let response = registry.call(tool, action, args.clone()).await;
        if response.ok {
            return (response, attempt);
        }
        let retryable = response
            .error_kind
            .map(|k| k.is_retryable())
            .unwrap_or(false);
        if !retryable || attempt >= MAX_ATTEMPTS {
            return (response, attempt);
        }
        tokio::time::sleep(BACKOFF[(attempt - 1) as usize]).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kernel_core::ErrorKind;
    use kernel_toolclient::ToolClient;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyClient {
        fail_times: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ToolClient for FlakyClient {
        async fn call(&self, action: &str, _args: HashMap<String, serde_json::Value>) -> ToolResponse {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_times {
                ToolResponse::err(action, ErrorKind::Transport, "flaky")
            } else {
                ToolResponse::ok(action, serde_json::json!({"n": n}))
            }
        }

        async fn health(&self) -> ToolResponse {
            ToolResponse::ok("health", serde_json::json!({"status": "ok"}))
        }
    }

    struct AlwaysBadRequest;

    #[async_trait]
    impl ToolClient for AlwaysBadRequest {
        async fn call(&self, action: &str, _args: HashMap<String, serde_json::Value>) -> ToolResponse {
            ToolResponse::err(action, ErrorKind::BadRequest, "nope")
        }

        async fn health(&self) -> ToolResponse {
            ToolResponse::ok("health", serde_json::json!({"status": "ok"}))
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let mut registry = ToolClientRegistry::new();
        registry.register("rag", Arc::new(FlakyClient { fail_times: 2, calls: AtomicU32::new(0) }));
        let (resp, attempts) = call_with_retry(&registry, "rag", "query", HashMap::new()).await;
        assert!(resp.ok);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mut registry = ToolClientRegistry::new();
        registry.register("rag", Arc::new(FlakyClient { fail_times: 10, calls: AtomicU32::new(0) }));
        let (resp, attempts) = call_with_retry(&registry, "rag", "query", HashMap::new()).await;
        assert!(!resp.ok);
        assert_eq!(attempts, MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn non_retryable_failure_does_not_retry() {
        let mut registry = ToolClientRegistry::new();
        registry.register("files", Arc::new(AlwaysBadRequest));
        let (resp, attempts) = call_with_retry(&registry, "files", "read_file", HashMap::new()).await;
        assert!(!resp.ok);
        assert_eq!(attempts, 1);
    }
}
