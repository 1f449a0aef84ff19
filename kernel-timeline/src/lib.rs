#![deny(missing_docs)]
//! The Timeline: an append-only, modality-tagged event log shared by
//! every component of the orchestration kernel.

mod error;
mod store;
mod types;

pub use error::TimelineError;
pub use store::Timeline;
pub use types::{TimelineEvent, TimelineFilters};
