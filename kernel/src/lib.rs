#![deny(missing_docs)]
//! The orchestration kernel: wires the Tool-Client registry,
//! Context Builder, Planner, Executor, Cognitive Engine, and Intent
//! router together behind one HTTP endpoint.

pub mod config;
pub mod error;
mod http;
mod kernel;

pub use config::{ConfigError, KernelConfig};
pub use error::{exit_code, KernelError};
pub use http::app;
pub use kernel::{health_report, Kernel, OrchestrateRequest, OrchestrateResponse};
