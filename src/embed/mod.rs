//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait for different embedding backends
//! - A local FastEmbed backend (feature `local-embed`)
//! - Batch processing for efficiency

#[cfg(feature = "local-embed")]
mod fastembed_impl;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;

use crate::error::Result;
use async_trait::async_trait;

/// Cosine similarity of two vectors; 0.0 when either is zero or lengths differ
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Embed texts in batches, calling `on_batch` with the size of each finished batch
pub async fn embed_in_batches<F>(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
    mut on_batch: F,
) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(usize),
{
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size.max(1)) {
        let embeddings = embedder.embed(chunk.to_vec()).await?;
        all_embeddings.extend(embeddings);
        on_batch(chunk.len());
    }

    Ok(all_embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "length"
        }
    }

    #[tokio::test]
    async fn test_embed_in_batches_preserves_order() {
        let texts: Vec<String> = (0..10).map(|i| "x".repeat(i)).collect();
        let mut batches = Vec::new();

        let embeddings = embed_in_batches(&LengthEmbedder, texts, 3, |n| batches.push(n))
            .await
            .unwrap();

        assert_eq!(batches, vec![3, 3, 3, 1]);
        assert_eq!(embeddings.len(), 10);
        assert_eq!(embeddings[7][0], 7.0);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
