//! Embedding Module
//!
//! The summarizer only sees [`EmbeddingProvider`]. Two providers ship with the
//! crate:
//! - [`FastEmbedProvider`]: FastEmbed (ONNX-based, local inference) running
//!   sentence-transformers all-MiniLM-L6-v2.
//! - [`HashingEmbedder`]: feature-hashed bag of words. No model download, used
//!   for offline smoke runs and tests.
//!
//! Every provider returns unit-length vectors.

mod hashing;

pub use hashing::{HashingEmbedder, DEFAULT_HASHING_DIMENSION};

use crate::summarizer::vector::normalize;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default embedding model
const DEFAULT_MODEL: EmbeddingModel = EmbeddingModel::AllMiniLML6V2;

/// Embedding dimension for AllMiniLML6V2
pub const EMBEDDING_DIMENSION: usize = 384;

/// Cached embeddings kept across documents of one run
const DEFAULT_CACHE_SIZE: usize = 4096;

/// Maps text to fixed-dimension unit vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the underlying model, recorded in the aspect store.
    fn model_name(&self) -> &str;

    /// Length of every returned vector.
    fn dimension(&self) -> usize;

    /// Embed `texts`, returning one unit vector per input in the same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embed_batch(&[text.to_string()]).await?;
        out.pop().context("No embedding generated")
    }
}

/// FastEmbed-backed provider with an LRU cache.
pub struct FastEmbedProvider {
    model: Arc<RwLock<TextEmbedding>>,
    cache: Arc<RwLock<LruCache<String, Vec<f32>>>>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Create a provider with the default model
    pub async fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL, EMBEDDING_DIMENSION).await
    }

    /// Create a provider with a specific model and its output dimension
    pub async fn with_model(embedding_model: EmbeddingModel, dimension: usize) -> Result<Self> {
        let model_name = format!("{:?}", embedding_model);
        let init_options = InitOptions::new(embedding_model);

        let model = tokio::task::spawn_blocking(move || TextEmbedding::try_new(init_options))
            .await
            .context("Failed to spawn blocking task")?
            .context("Failed to initialize embedding model")?;

        let cache_size = NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);

        tracing::info!(model = %model_name, "embedding model ready");

        Ok(Self {
            model: Arc::new(RwLock::new(model)),
            cache: Arc::new(RwLock::new(LruCache::new(cache_size))),
            model_name,
            dimension,
        })
    }

    /// Clear the cache
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// Get cache statistics (used, capacity)
    pub async fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.read().await;
        (cache.len(), cache.cap().get())
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut to_embed = Vec::new();
        let mut to_embed_indices = Vec::new();

        {
            let mut cache = self.cache.write().await;
            for (i, text) in texts.iter().enumerate() {
                match cache.get(text) {
                    Some(cached) => results.push(Some(cached.clone())),
                    None => {
                        to_embed.push(text.clone());
                        to_embed_indices.push(i);
                        results.push(None);
                    }
                }
            }
        }

        if !to_embed.is_empty() {
            let model = self.model.clone();
            let batch = to_embed.clone();

            let embeddings = tokio::task::spawn_blocking(move || {
                let model_guard = futures::executor::block_on(model.read());
                model_guard.embed(batch, None)
            })
            .await
            .context("Failed to spawn blocking task")?
            .context("Failed to generate embeddings")?;

            if embeddings.len() != to_embed.len() {
                anyhow::bail!(
                    "Model returned {} embeddings for {} texts",
                    embeddings.len(),
                    to_embed.len()
                );
            }

            let mut cache = self.cache.write().await;
            for ((text, idx), mut embedding) in to_embed
                .into_iter()
                .zip(to_embed_indices)
                .zip(embeddings)
            {
                normalize(&mut embedding);
                cache.put(text, embedding.clone());
                results[idx] = Some(embedding);
            }
        }

        results
            .into_iter()
            .map(|e| e.context("Missing embedding in batch"))
            .collect()
    }
}
