//! The pluggable embedder trait and a deterministic local
//! implementation that keeps the RAG store fully exercisable offline.

use async_trait::async_trait;
use thiserror::Error;

/// Fixed embedding dimensionality used across the store.
pub const EMBEDDING_DIM: usize = 384;

/// Errors from an [`Embedder`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The embedder backend is unreachable or unavailable.
    #[error("embedder unavailable: {0}")]
    Unavailable(String),
}

/// Produces fixed-dimension embeddings for text. Object-safe so the
/// store can hold it behind `Arc<dyn Embedder>`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, same order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text. Default impl delegates to `embed_batch`.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut v = self.embed_batch(&[text]).await?;
        Ok(v.pop().unwrap_or_default())
    }
}

/// A deterministic, hash-projected bag-of-trigrams embedder.
///
/// Not a real semantic embedding model — it exists so the store, the
/// chunker, and similarity search are exercisable and testable without
/// a network call or a loaded model. A production deployment swaps in
/// a real local embedding model behind the same [`Embedder`] trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEmbedder;

impl LocalEmbedder {
    /// Construct the local embedder.
    pub fn new() -> Self {
        Self
    }

    fn embed_text(text: &str) -> Vec<f32> {
        let mut acc = vec![0f32; EMBEDDING_DIM];
        let normalized = text.to_ascii_lowercase();
        let chars: Vec<char> = normalized.chars().collect();
        if chars.is_empty() {
            return acc;
        }
        let window = 3.min(chars.len());
        for i in 0..=(chars.len() - window) {
            let gram: String = chars[i..i + window].iter().collect();
            let bucket = djb2(&gram) as usize % EMBEDDING_DIM;
            acc[bucket] += 1.0;
        }
        let norm = acc.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut acc {
                *v /= norm;
            }
        }
        acc
    }
}

fn djb2(s: &str) -> u64 {
    let mut hash: u64 = 5381;
    for b in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(b as u64);
    }
    hash
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| Self::embed_text(t)).collect())
    }
}

/// Cosine similarity between two equal-length vectors. Returns 0.0 if
/// either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
