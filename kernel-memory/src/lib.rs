#![deny(missing_docs)]
//! Session memory for the orchestration kernel:
//! append-only per-session message history, hierarchically laid out
//! and archived by age, searchable by substring and (optionally)
//! embedding similarity.

mod error;
mod fs;
mod memory;
mod store;
mod types;

pub use error::MemoryError;
pub use fs::FsSessionStore;
pub use kernel_rag::Embedder;
pub use memory::InMemorySessionStore;
pub use store::MemoryStore;
pub use types::{SessionMessage, SessionSearchHit};
