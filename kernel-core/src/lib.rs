//! # kernel-core — shared vocabulary for the orchestration kernel
//!
//! This crate defines the types and small traits that every other
//! `kernel-*` crate builds on: identifiers, the error-kind taxonomy,
//! durations, dataset/modality tags, the tool catalog, and the
//! plan/execution vocabulary that flows between the Planner and the
//! Executor.
//!
//! ## Design principle
//!
//! Nothing here talks to the network or the filesystem. This crate is
//! pure data + trait definitions so that every downstream crate —
//! Tool-Client, RAG store, Session Memory, Context Builder, Planner,
//! Executor, Cognitive Engine, Intent router — shares one vocabulary
//! instead of redefining overlapping types at each boundary.

#![deny(missing_docs)]

pub mod catalog;
pub mod dataset;
pub mod duration;
pub mod error;
pub mod id;
pub mod modality;
pub mod plan;
pub mod tool;

pub use catalog::{ActionSpec, PreferredLlm, ToolCatalog, CATALOG};
pub use dataset::Dataset;
pub use duration::DurationMs;
pub use error::{ErrorKind, HasErrorKind};
pub use id::{DocumentId, EventId, SessionId};
pub use modality::Modality;
pub use plan::{ExecutionMode, ExecutionResult, Plan, PlanStep, StepStatus};
pub use tool::{ToolRequest, ToolResponse};
