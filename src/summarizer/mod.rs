//! Extractive summarization engine
//!
//! Stages, in order:
//! 1. [`normalizer`]: canonical text
//! 2. [`segmenter`] and [`money`]: bounded passages plus a money stream
//! 3. embedding, through [`crate::embedding::EmbeddingProvider`]
//! 4. [`graph`]: percentile-thresholded similarity graph
//! 5. [`partition`]: community detection
//! 6. [`aspects`]: cluster relevance against aspects, title and description
//! 7. [`selector`]: centrality and isolation selection inside clusters
//! 8. [`pricing`]: centrality filter over money passages
//! 9. [`assembler`]: document order, dedup, concatenation
//!
//! [`pipeline::SummaryContext`] runs the stages for one document.

pub mod aspects;
pub mod assembler;
pub mod error;
pub mod graph;
pub mod money;
pub mod normalizer;
pub mod outcome;
pub mod partition;
pub mod percentile;
pub mod pipeline;
pub mod pricing;
pub mod segmenter;
pub mod selector;
pub mod vector;

pub use aspects::{AspectCatalog, AspectDefinition, AspectStore, ClusterScore, ScoringWeights};
pub use error::{Result, SummarizerError};
pub use graph::SimilarityGraph;
pub use outcome::{EmptyReason, Selection};
pub use partition::{LouvainPartitioner, Partitioner};
pub use pipeline::{DocumentSummary, SummaryContext, SummaryOutcome, SummaryStats};
pub use segmenter::{Passage, SegmentationStrategy, Segmenter};
