//! Per-document orchestration.
//!
//! [`SummaryContext`] holds everything a run needs (configuration, aspect
//! store, embedding provider, partitioner) and is shared read-only across the
//! documents of a batch.

use super::aspects::{score_clusters, select_by_aspects, select_clusters, AspectStore, ScoringWeights};
use super::assembler::{assemble, in_document_order, join_passages};
use super::error::{Result, SummarizerError};
use super::graph::build_similarity_graph;
use super::outcome::{EmptyReason, Selection};
use super::partition::{LouvainPartitioner, Partitioner};
use super::pricing::select_pricing;
use super::segmenter::{Passage, Segmenter};
use super::selector::{select_passages, SelectionOptions};
use super::vector::normalize;
use crate::config::{SummarizerConfig, SummaryStrategy};
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(120);

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub normalized_len: usize,
    pub passages: usize,
    pub money_passages: usize,
    pub edges: usize,
    pub cluster_sizes: Vec<usize>,
    pub selected_clusters: usize,
    pub centrality_selected: usize,
    pub isolation_selected: usize,
    pub pricing_selected: usize,
    pub summary_len: usize,
}

/// Summary of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Centrality-mode selection, in document order
    pub centrality: Vec<Passage>,
    /// Isolation-mode selection, in document order
    pub isolation: Vec<Passage>,
    /// Selected money passages, in document order
    pub pricing: Vec<Passage>,
    /// Centrality text followed by pricing text
    pub text: String,
    pub pricing_text: String,
    pub isolation_text: String,
    pub stats: SummaryStats,
}

/// Result of summarizing one document.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Summary(DocumentSummary),
    Empty(EmptyReason),
}

impl SummaryOutcome {
    pub fn summary(&self) -> Option<&DocumentSummary> {
        match self {
            Self::Summary(s) => Some(s),
            Self::Empty(_) => None,
        }
    }

    pub fn empty_reason(&self) -> Option<EmptyReason> {
        match self {
            Self::Summary(_) => None,
            Self::Empty(reason) => Some(*reason),
        }
    }
}

/// Main-stream passage indices chosen by the active strategy.
struct MainSelection {
    centrality: Vec<usize>,
    isolation: Vec<usize>,
}

/// Shared, immutable state for summarizing documents.
pub struct SummaryContext {
    config: SummarizerConfig,
    aspects: AspectStore,
    provider: Arc<dyn EmbeddingProvider>,
    partitioner: Box<dyn Partitioner>,
    embed_timeout: Duration,
}

impl SummaryContext {
    /// Validate the configuration and aspect store against the provider.
    pub fn new(
        config: SummarizerConfig,
        aspects: AspectStore,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        config.validate()?;
        aspects.validate().map_err(SummarizerError::InvalidAspects)?;
        if aspects.dimension != provider.dimension() {
            return Err(SummarizerError::DimensionMismatch {
                expected: aspects.dimension,
                got: provider.dimension(),
            });
        }
        if aspects.model != provider.model_name() {
            tracing::warn!(
                store = %aspects.model,
                provider = %provider.model_name(),
                "aspect store was built with a different model"
            );
        }

        let partitioner = Box::new(LouvainPartitioner::new(config.partition_seed));
        Ok(Self {
            config,
            aspects,
            provider,
            partitioner,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
        })
    }

    /// Replace the community detection backend.
    pub fn with_partitioner(mut self, partitioner: Box<dyn Partitioner>) -> Self {
        self.partitioner = partitioner;
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    pub fn aspects(&self) -> &AspectStore {
        &self.aspects
    }

    /// Summarize the combined attachment text of `doc`.
    pub async fn summarize_document(&self, doc: &Document) -> Result<SummaryOutcome> {
        let outcome = self
            .summarize(&doc.combined_text(), &doc.title, doc.description())
            .await?;
        match &outcome {
            SummaryOutcome::Summary(s) => tracing::info!(
                document = %doc.id,
                passages = s.stats.passages,
                selected = s.stats.centrality_selected,
                pricing = s.stats.pricing_selected,
                "summarized"
            ),
            SummaryOutcome::Empty(reason) => {
                tracing::warn!(document = %doc.id, %reason, "nothing to summarize")
            }
        }
        Ok(outcome)
    }

    /// Summarize raw text.
    ///
    /// An empty main selection yields `SummaryOutcome::Empty` and the pricing
    /// stream is not evaluated. Missing money passages only leave the pricing
    /// section empty.
    pub async fn summarize(
        &self,
        raw: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<SummaryOutcome> {
        let cfg = &self.config;
        let normalized = cfg.segmentation.normalize(raw);
        if normalized.is_empty() {
            return Ok(SummaryOutcome::Empty(EmptyReason::NoInput));
        }

        let segmenter = Segmenter {
            strategy: cfg.segmentation,
            min_len: cfg.min_len,
            max_len: cfg.max_len,
            chunk_len: cfg.chunk_len,
        };
        let segmented = segmenter.segment(&normalized);
        let mut stats = SummaryStats {
            normalized_len: normalized.chars().count(),
            passages: segmented.passages.len(),
            money_passages: segmented.money.len(),
            ..Default::default()
        };
        tracing::debug!(
            passages = stats.passages,
            money = stats.money_passages,
            "segmented"
        );
        if segmented.passages.is_empty() {
            return Ok(SummaryOutcome::Empty(EmptyReason::NoPassages));
        }

        let description = description.map(str::trim).filter(|d| !d.is_empty());

        // One batch: passages, money passages, title, then description.
        let mut texts: Vec<String> = segmented
            .passages
            .iter()
            .chain(segmented.money.iter())
            .map(|p| p.text.clone())
            .collect();
        texts.push(title.to_lowercase());
        if let Some(d) = description {
            texts.push(d.to_lowercase());
        }
        let mut vectors = self.embed(&texts).await?;
        let description_vec = description.and_then(|_| vectors.pop());
        let title_vec = vectors.pop().unwrap_or_default();
        let money_vecs = vectors.split_off(segmented.passages.len());
        let passage_vecs = vectors;

        let main = match self.select_main(&passage_vecs, &title_vec, description_vec.as_deref(), &mut stats) {
            Ok(main) => main,
            Err(reason) => return Ok(SummaryOutcome::Empty(reason)),
        };

        let pricing_idx = select_pricing(&money_vecs, cfg.pricing_percentile);

        let pick = |pool: &[Passage], idx: &[usize]| {
            in_document_order(idx.iter().filter_map(|&i| pool.get(i).cloned()))
        };
        let centrality = pick(&segmented.passages, &main.centrality);
        let isolation = pick(&segmented.passages, &main.isolation);
        let pricing = pick(&segmented.money, &pricing_idx);

        let text = assemble(&centrality, &pricing);
        stats.centrality_selected = centrality.len();
        stats.isolation_selected = isolation.len();
        stats.pricing_selected = pricing.len();
        stats.summary_len = text.chars().count();

        Ok(SummaryOutcome::Summary(DocumentSummary {
            pricing_text: join_passages(&pricing),
            isolation_text: join_passages(&isolation),
            text,
            centrality,
            isolation,
            pricing,
            stats,
        }))
    }

    fn select_main(
        &self,
        embeddings: &[Vec<f32>],
        title: &[f32],
        description: Option<&[f32]>,
        stats: &mut SummaryStats,
    ) -> std::result::Result<MainSelection, EmptyReason> {
        let cfg = &self.config;

        if cfg.strategy == SummaryStrategy::AspectDirect {
            let selected = select_by_aspects(
                embeddings,
                &self.aspects,
                cfg.aspect_direct_percentile,
                cfg.aspect_direct_top_k,
            )
            .into_result()?;
            return Ok(MainSelection {
                centrality: selected,
                isolation: Vec::new(),
            });
        }

        let graph = build_similarity_graph(embeddings, cfg.edge_percentile);
        stats.edges = graph.edge_count();
        if graph.edge_count() == 0 {
            return Err(EmptyReason::Ungraphed);
        }

        let clusters: Vec<Vec<usize>> = self
            .partitioner
            .partition(&graph)
            .into_iter()
            .filter(|c| !c.is_empty())
            .collect();
        stats.cluster_sizes = clusters.iter().map(Vec::len).collect();
        let clusters = Selection::from_vec(clusters, EmptyReason::NoClusters).into_result()?;

        let weights = ScoringWeights::resolve(cfg.weights, description.is_some());
        let scores = score_clusters(embeddings, &clusters, &self.aspects, title, description, weights);
        let selected = select_clusters(scores, cfg.aspect_percentile).into_result()?;
        stats.selected_clusters = selected.len();
        for s in &selected {
            tracing::debug!(
                size = s.members.len(),
                score = s.score,
                aspect = s.best_aspect.as_deref().unwrap_or("-"),
                "selected cluster"
            );
        }

        let members: Vec<Vec<usize>> = selected.into_iter().map(|s| s.members).collect();
        let picked = select_passages(
            embeddings,
            &members,
            SelectionOptions {
                centrality_percentile: cfg.centrality_percentile,
                isolation_threshold: cfg.mmr_isolation_threshold,
                tiny_cluster_size: cfg.tiny_cluster_size,
            },
        );
        if picked.centrality.is_empty() {
            return Err(EmptyReason::NoRelevantPassages);
        }
        Ok(MainSelection {
            centrality: picked.centrality,
            isolation: picked.isolation,
        })
    }

    /// Embed with the configured timeout and check the provider's output.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = tokio::time::timeout(self.embed_timeout, self.provider.embed_batch(texts))
            .await
            .map_err(|_| SummarizerError::EmbeddingTimeout(self.embed_timeout))?
            .map_err(SummarizerError::Embedding)?;

        if vectors.len() != texts.len() {
            return Err(SummarizerError::EmbeddingCount {
                expected: texts.len(),
                got: vectors.len(),
            });
        }
        for v in vectors.iter_mut() {
            if v.len() != self.aspects.dimension {
                return Err(SummarizerError::DimensionMismatch {
                    expected: self.aspects.dimension,
                    got: v.len(),
                });
            }
            normalize(v);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::summarizer::aspects::{AspectCatalog, AspectDefinition};
    use async_trait::async_trait;

    const VOCAB: [&str; 4] = ["scope", "liability", "price", "schedule"];

    /// One axis per vocabulary word, plus a constant axis so no text is zero.
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keywords"
        }

        fn dimension(&self) -> usize {
            VOCAB.len() + 1
        }

        async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v: Vec<f32> = VOCAB.iter().map(|w| t.matches(w).count() as f32).collect();
                    v.push(0.01);
                    normalize(&mut v);
                    v
                })
                .collect())
        }
    }

    struct SlowEmbedder;

    #[async_trait]
    impl EmbeddingProvider for SlowEmbedder {
        fn model_name(&self) -> &str {
            "slow"
        }

        fn dimension(&self) -> usize {
            VOCAB.len() + 1
        }

        async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![vec![0.0; VOCAB.len() + 1]; texts.len()])
        }
    }

    fn axis(i: usize) -> Vec<f32> {
        let mut v = vec![0.0; VOCAB.len() + 1];
        v[i] = 1.0;
        v
    }

    fn store() -> AspectStore {
        AspectStore::new(
            "keywords",
            vec![
                AspectDefinition {
                    name: "pricing".into(),
                    centroid: axis(2),
                },
                AspectDefinition {
                    name: "scope_of_work".into(),
                    centroid: axis(0),
                },
            ],
        )
        .unwrap()
    }

    fn config() -> SummarizerConfig {
        SummarizerConfig {
            min_len: 10,
            max_len: 200,
            ..Default::default()
        }
    }

    fn context(config: SummarizerConfig) -> SummaryContext {
        SummaryContext::new(config, store(), Arc::new(KeywordEmbedder)).unwrap()
    }

    const DOC: &str = "The scope covers scope items for the agency.\n\n\
        Contractor scope includes the full scope of services.\n\n\
        Additional scope tasks are part of this scope.\n\n\
        Liability limits apply and liability is capped.\n\n\
        The total price is $50,000 for the contract.";

    #[tokio::test]
    async fn test_scope_cluster_and_pricing_selected() {
        let ctx = context(config());
        let outcome = ctx.summarize(DOC, "Scope of services", None).await.unwrap();
        let summary = outcome.summary().expect("summary");

        assert_eq!(summary.stats.passages, 4);
        assert_eq!(summary.stats.money_passages, 1);
        let ordinals: Vec<usize> = summary.centrality.iter().map(|p| p.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
        assert_eq!(summary.pricing.len(), 1);
        assert!(summary.pricing_text.contains("$50,000"));
        assert!(!summary.text.contains("liability"));
        assert!(summary.text.ends_with(&summary.pricing_text));
    }

    #[tokio::test]
    async fn test_single_passage_is_ungraphed() {
        let ctx = context(config());
        let outcome = ctx.summarize("Only scope here.", "Scope", None).await.unwrap();
        assert_eq!(outcome, SummaryOutcome::Empty(EmptyReason::Ungraphed));
    }

    #[tokio::test]
    async fn test_blank_input() {
        let ctx = context(config());
        let outcome = ctx.summarize(" \n\t ", "Scope", None).await.unwrap();
        assert_eq!(outcome.empty_reason(), Some(EmptyReason::NoInput));
    }

    #[tokio::test]
    async fn test_money_only_document_has_no_passages() {
        let ctx = context(config());
        let outcome = ctx.summarize("Price is $10 per unit.", "Price", None).await.unwrap();
        assert_eq!(outcome.empty_reason(), Some(EmptyReason::NoPassages));
    }

    #[tokio::test]
    async fn test_aspect_direct_strategy() {
        let ctx = context(SummarizerConfig {
            strategy: SummaryStrategy::AspectDirect,
            aspect_direct_top_k: Some(1),
            ..config()
        });
        let outcome = ctx.summarize(DOC, "Scope", None).await.unwrap();
        let summary = outcome.summary().expect("summary");
        assert!(summary.isolation.is_empty());
        assert!(!summary.centrality.is_empty());
        assert!(summary.centrality.len() <= 2);
        assert_eq!(summary.stats.edges, 0);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let ctx = context(config());
        let a = ctx.summarize(DOC, "Scope", Some("scope work")).await.unwrap();
        let b = ctx.summarize(DOC, "Scope", Some("scope work")).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_embedding_timeout() {
        let ctx = SummaryContext::new(config(), store(), Arc::new(SlowEmbedder))
            .unwrap()
            .with_embed_timeout(Duration::from_millis(20));
        let err = ctx.summarize(DOC, "Scope", None).await.unwrap_err();
        assert!(matches!(err, SummarizerError::EmbeddingTimeout(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let result = SummaryContext::new(config(), store(), Arc::new(HashingEmbedder::new(64)));
        assert!(matches!(result, Err(SummarizerError::DimensionMismatch { .. })));
    }

    #[tokio::test]
    async fn test_hashing_provider_with_builtin_catalog() {
        let provider = Arc::new(HashingEmbedder::new(128));
        let catalog = AspectCatalog::builtin().unwrap();
        let aspects = AspectStore::build(provider.as_ref(), &catalog).await.unwrap();
        let ctx = SummaryContext::new(config(), aspects, provider).unwrap();
        // Two identical paragraphs always share an edge, whatever the hashing.
        let text = "The scope covers scope items for the agency.\n\n\
            The scope covers scope items for the agency.\n\n\
            Liability limits apply and liability is capped.";
        let outcome = ctx.summarize(text, "Scope of services", None).await.unwrap();
        let summary = outcome.summary().expect("summary");
        assert_eq!(summary.stats.passages, 3);
        assert!(summary.stats.edges >= 1);
        assert!(summary.stats.centrality_selected > 0);
    }
}
