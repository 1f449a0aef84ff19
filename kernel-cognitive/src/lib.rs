#![deny(missing_docs)]
//! The Cognitive Engine for the orchestration kernel:
//! background housekeeping invoked either by an autonomous cycle tick
//! or explicitly — autosummarization, vision/audio sync into RAG and
//! session memory, and rule-based proactive suggestions.
//!
//! The interval ticker itself is owned by the kernel facade; this
//! crate only exposes [`CognitiveEngine::run_autonomous_cycle`] as the
//! single entry point both the ticker and the orchestration endpoint's
//! post-hooks call.

mod engine;
mod error;
mod suggestion;

pub use engine::{CognitiveEngine, CycleReport, StepOutcome};
pub use error::CognitiveError;
pub use suggestion::{proactive_suggestions, Suggestion, SuggestionContext};
