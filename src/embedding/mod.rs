mod fastembed_manager;
mod hash_embedder;

pub use fastembed_manager::FastEmbedManager;
pub use hash_embedder::{HASH_EMBEDDER_NAME, HashEmbedder};

use crate::error::EmbeddingError;

/// Trait for embedding generation
///
/// Implementations are blocking; async callers run them on the blocking pool.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of text
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Get the dimension of the embeddings
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Scale `vector` to unit length in place. Zero vectors stay zero.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Dot product; the cosine similarity of unit vectors
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
