//! Feature-hashed bag-of-words embeddings.
//!
//! Each lowercase alphanumeric token is hashed into one of `dimension` buckets
//! with a hash-derived sign. Texts sharing vocabulary end up close, which is
//! enough for offline runs and deterministic tests.
//!
//! Tokens are hashed with SHA-256, so vectors (and aspect stores built from
//! them) are identical across builds and platforms.

use super::EmbeddingProvider;
use crate::summarizer::vector::normalize;
use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

pub const DEFAULT_HASHING_DIMENSION: usize = 256;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_name: String,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSION)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_name: format!("hashing-sha256-{}", dimension),
        }
    }

    /// Embed synchronously. Texts without tokens map to the zero vector.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() > 1)
        {
            let h = token_hash(&token.to_lowercase());
            let bucket = (h % self.dimension as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        normalize(&mut v);
        v
    }
}

/// First eight bytes of the SHA-256 digest, little endian.
fn token_hash(token: &str) -> u64 {
    let digest = Sha256::digest(token.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::vector::{cosine_similarity, norm};

    #[test]
    fn test_deterministic_and_unit() {
        let e = HashingEmbedder::default();
        let a = e.embed_sync("deliver monthly status reports");
        let b = e.embed_sync("deliver monthly status reports");
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_HASHING_DIMENSION);
        assert!((norm(&a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let e = HashingEmbedder::new(512);
        let a = e.embed_sync("contractor shall deliver monthly status reports");
        let b = e.embed_sync("contractor shall deliver weekly status reports");
        let c = e.embed_sync("indemnification governing law arbitration venue");
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[test]
    fn test_blank_text_is_zero() {
        let e = HashingEmbedder::new(8);
        assert_eq!(e.embed_sync("  . , "), vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let e = HashingEmbedder::new(64);
        let texts = vec!["alpha beta".to_string(), "gamma delta".to_string()];
        let batch = e.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[1], e.embed_text("gamma delta").await.unwrap());
    }

    #[test]
    fn test_token_buckets_are_fixed() {
        let e = HashingEmbedder::new(256);
        let scope = e.embed_sync("scope");
        assert_eq!(scope[95], 1.0);
        let price = e.embed_sync("price");
        assert_eq!(price[104], -1.0);
        assert_eq!(e.model_name(), "hashing-sha256-256");
    }
}
