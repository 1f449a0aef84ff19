#![deny(missing_docs)]
//! The Executor for the orchestration kernel: dispatches a
//! [`kernel_core::Plan`]'s steps against the Tool-Client Registry,
//! retries retriable failures, gates sensitive steps behind
//! confirmation, substitutes `$previous`, and honors cancellation.

mod cancel;
mod dry_run;
mod error;
mod executor;
mod retry;
mod substitute;

pub use cancel::CancelHandle;
pub use dry_run::{dry_run, DryRunReport, InvalidStep};
pub use error::ExecutorError;
pub use executor::{ExecuteOutcome, Executor};
