//! The kernel's HTTP surface: `POST /orchestrate` and `GET /health`.

use crate::kernel::{health_report, Kernel, OrchestrateRequest, OrchestrateResponse};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Build the axum [`Router`] over a shared [`Kernel`].
pub fn app(kernel: Arc<Kernel>) -> Router {
    Router::new()
        .route("/orchestrate", post(orchestrate))
        .route("/health", get(health))
        .with_state(kernel)
}

async fn orchestrate(
    State(kernel): State<Arc<Kernel>>,
    Json(request): Json<OrchestrateRequest>,
) -> Json<OrchestrateResponse> {
    Json(kernel.orchestrate(request).await)
}

/// Body of `GET /health`: the kernel's own readiness plus a fan-out to
/// every registered Tool-Client. A tool reporting unhealthy (or not
/// registered at all) never fails this response — only the kernel's
/// own inability to answer would.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    tools: HashMap<String, bool>,
}

async fn health(State(kernel): State<Arc<Kernel>>) -> Json<HealthResponse> {
    let tools = health_report(kernel.tools()).await;
    Json(HealthResponse { status: "ok", tools })
}
