#![deny(missing_docs)]
//! The Intent router for the orchestration kernel:
//! keyword/regex classification of a user message into a coarse
//! [`Intent`] bucket, and a short-circuiting [`SensitivePolicy`]
//! pipeline that tags plan steps requiring confirmation.

mod classify;
mod error;
mod policy;

pub use classify::{classify, Intent};
pub use error::IntentError;
pub use policy::{CatalogSensitivePolicy, SensitiveDecision, SensitivePolicy, SensitivePolicyPipeline};
