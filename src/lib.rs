//! rfp-distill - extractive summarization of procurement solicitations
//!
//! Condenses a solicitation (title, optional description, attachment text)
//! into the passages most relevant to its topic and to a fixed set of domain
//! aspects, plus a separate pricing extract.
//!
//! # Architecture
//!
//! - **Segmentation**: paragraph-aware or fixed-width passages, with passages
//!   that mention money routed to their own stream
//! - **Similarity graph + communities**: passages are linked when their
//!   similarity reaches a per-document percentile, then clustered by
//!   modularity maximization
//! - **Aspect scoring**: clusters are ranked against the title, description
//!   and precomputed aspect centroids
//! - **Selection**: centrality and isolation modes inside selected clusters,
//!   centrality over money passages
//!
//! # Main Modules
//!
//! - [`summarizer`] - the engine and [`summarizer::SummaryContext`]
//! - [`embedding`] - embedding providers (FastEmbed, hashing)
//! - [`config`] - JSON configuration with environment overrides
//! - [`document`] - documents, manifests and directory batches
//! - [`output`] - summary files
//!
//! # Example
//!
//! ```rust,no_run
//! use rfp_distill::embedding::HashingEmbedder;
//! use rfp_distill::summarizer::{AspectCatalog, AspectStore, SummaryContext, SummaryOutcome};
//! use rfp_distill::config::SummarizerConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = Arc::new(HashingEmbedder::default());
//! let aspects = AspectStore::build(provider.as_ref(), &AspectCatalog::builtin()?).await?;
//! let ctx = SummaryContext::new(SummarizerConfig::default(), aspects, provider)?;
//!
//! let text = std::fs::read_to_string("rfp.txt")?;
//! match ctx.summarize(&text, "Janitorial services", None).await? {
//!     SummaryOutcome::Summary(s) => println!("{}", s.text),
//!     SummaryOutcome::Empty(reason) => eprintln!("nothing kept: {}", reason),
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod document;
pub mod embedding;
pub mod logging;
pub mod output;
pub mod summarizer;

pub use config::AppConfig;
pub use document::Document;
pub use embedding::{EmbeddingProvider, FastEmbedProvider, HashingEmbedder};
pub use summarizer::{DocumentSummary, EmptyReason, SummaryContext, SummaryOutcome};
