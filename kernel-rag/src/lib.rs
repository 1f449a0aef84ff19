#![deny(missing_docs)]
//! The document store for the orchestration kernel: a
//! fixed dataset taxonomy, recursive chunking, pluggable embeddings,
//! and cosine-similarity search over an embedded relational store.

mod chunker;
mod embedder;
mod error;
mod store;
mod types;

pub use chunker::chunk_text;
pub use embedder::{cosine_similarity, EmbeddingError, Embedder, LocalEmbedder, EMBEDDING_DIM};
pub use error::RagError;
pub use store::RagStore;
pub use types::{ChunkMatch, DatasetInfo, Document, DocumentVersion, Priority, QueryFilters};
