//! The kernel binary: loads [`kernel::KernelConfig`], wires up every
//! store and Tool-Client, and serves `POST /orchestrate` / `GET
//! /health` over HTTP.

use kernel::{exit_code, Kernel, KernelConfig, KernelError};
use kernel_memory::FsSessionStore;
use kernel_rag::{LocalEmbedder, RagStore};
use kernel_timeline::Timeline;
use kernel_toolclient::{HttpToolClient, ToolClientRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn config_path() -> PathBuf {
    std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("kernel.toml"))
}

fn build_registry(config: &KernelConfig) -> ToolClientRegistry {
    let mut registry = ToolClientRegistry::new();
    for (tool, base_url) in &config.tool_base_urls {
        registry.register(tool.clone(), Arc::new(HttpToolClient::new(tool.clone(), base_url.clone())));
    }
    registry
}

async fn run(config: KernelConfig) -> Result<(), KernelError> {
    let registry = Arc::new(build_registry(&config));

    let rag = RagStore::open(Path::new(&config.storage.rag_db), Arc::new(LocalEmbedder::new()))
        .map_err(|e| KernelError::StorageCorruption(e.to_string()))?;
    let memory = FsSessionStore::new(Path::new(&config.storage.session_root));
    let timeline = Timeline::open(Path::new(&config.storage.timeline_db))
        .map_err(|e| KernelError::StorageCorruption(e.to_string()))?;

    let kernel = Arc::new(Kernel::new(registry, Arc::new(memory), Arc::new(rag), Arc::new(timeline)));

    let cycle_kernel = kernel.clone();
    let interval_secs = config.autonomous_cycle_interval_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            for session_id in cycle_kernel.known_sessions().await {
                let report = cycle_kernel.run_autonomous_cycle(session_id.as_str()).await;
                tracing::debug!(session = %session_id.as_str(), ?report, "autonomous cycle tick");
            }
        }
    });

    let app = kernel::app(kernel);
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .map_err(|e| KernelError::Other(Box::new(e)))?;
    tracing::info!(address = %config.bind_address, "kernel listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| KernelError::Other(Box::new(e)))?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match KernelConfig::load(&config_path()) {
        Ok(config) => config,
        Err(e) => {
            let error = KernelError::Config(e);
            tracing::error!(error = %error, "fatal configuration error");
            std::process::exit(exit_code(&error));
        }
    };

    if let Err(error) = run(config).await {
        tracing::error!(error = %error, "kernel exited with error");
        std::process::exit(exit_code(&error));
    }
}
