//! Aspect reference vectors and cluster relevance scoring.
//!
//! An aspect is a topical category of a solicitation (scope of work, timeline,
//! pricing, ...) represented by the normalized centroid of a handful of
//! curated example passages. Centroids are built once offline, stored with
//! bincode and loaded read-only at startup.

use super::error::{Result, SummarizerError};
use super::outcome::{EmptyReason, Selection};
use super::percentile::{percentile, select_at_or_above};
use super::vector::{centroid, centroid_of, cosine_similarity, dot, norm, normalize};
use crate::embedding::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Curated examples shipped with the crate
const BUILTIN_CATALOG: &str = include_str!("../../assets/aspect_examples.json");

/// Allowed deviation from unit length for stored centroids
const UNIT_TOLERANCE: f32 = 1e-3;

/// Example texts per aspect name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AspectCatalog {
    pub examples: BTreeMap<String, Vec<String>>,
}

impl AspectCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        serde_json::from_str(BUILTIN_CATALOG)
            .map_err(|e| SummarizerError::InvalidAspects(format!("builtin catalog: {}", e)))
    }

    /// Load a `{ "aspect": ["example", ...] }` JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| {
            SummarizerError::InvalidAspects(format!("{}: {}", path.as_ref().display(), e))
        })
    }
}

/// One aspect and its unit-length centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectDefinition {
    pub name: String,
    pub centroid: Vec<f32>,
}

/// The persisted set of aspect centroids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectStore {
    /// Embedding model the centroids were computed with
    pub model: String,
    pub dimension: usize,
    pub aspects: Vec<AspectDefinition>,
}

impl AspectStore {
    /// Assemble and validate a store.
    pub fn new(model: impl Into<String>, aspects: Vec<AspectDefinition>) -> Result<Self> {
        let dimension = aspects.first().map(|a| a.centroid.len()).unwrap_or(0);
        let store = Self {
            model: model.into(),
            dimension,
            aspects,
        };
        store.validate().map_err(SummarizerError::InvalidAspects)?;
        Ok(store)
    }

    /// Embed every example of every aspect and keep one normalized centroid per aspect.
    pub async fn build(provider: &dyn EmbeddingProvider, catalog: &AspectCatalog) -> Result<Self> {
        let mut aspects = Vec::with_capacity(catalog.examples.len());
        for (name, examples) in &catalog.examples {
            if examples.is_empty() {
                return Err(SummarizerError::InvalidAspects(format!(
                    "aspect '{}' has no examples",
                    name
                )));
            }
            let mut embeddings = provider
                .embed_batch(examples)
                .await
                .map_err(SummarizerError::Embedding)?;
            for e in embeddings.iter_mut() {
                normalize(e);
            }
            let mut c = centroid(&embeddings);
            normalize(&mut c);
            tracing::debug!(aspect = %name, examples = examples.len(), "built aspect centroid");
            aspects.push(AspectDefinition {
                name: name.clone(),
                centroid: c,
            });
        }
        Self::new(provider.model_name(), aspects)
    }

    /// [`AspectStore::build`] bounded by `timeout`.
    pub async fn build_within(
        provider: &dyn EmbeddingProvider,
        catalog: &AspectCatalog,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        tokio::time::timeout(timeout, Self::build(provider, catalog))
            .await
            .map_err(|_| SummarizerError::EmbeddingTimeout(timeout))?
    }

    /// Check the store invariants, returning a description of the first violation.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.aspects.is_empty() {
            return Err("no aspects".to_string());
        }
        if self.dimension == 0 {
            return Err("zero dimension".to_string());
        }
        let mut names = BTreeSet::new();
        for aspect in &self.aspects {
            if aspect.name.trim().is_empty() {
                return Err("empty aspect name".to_string());
            }
            if !names.insert(aspect.name.as_str()) {
                return Err(format!("duplicate aspect '{}'", aspect.name));
            }
            if aspect.centroid.len() != self.dimension {
                return Err(format!(
                    "aspect '{}' has dimension {}, expected {}",
                    aspect.name,
                    aspect.centroid.len(),
                    self.dimension
                ));
            }
            if aspect.centroid.iter().any(|v| !v.is_finite()) {
                return Err(format!("aspect '{}' has non-finite values", aspect.name));
            }
            let n = norm(&aspect.centroid);
            if (n - 1.0).abs() > UNIT_TOLERANCE {
                return Err(format!("aspect '{}' is not unit length (norm {})", aspect.name, n));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.aspects.iter().map(|a| a.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&AspectDefinition> {
        self.aspects.iter().find(|a| a.name == name)
    }

    /// Highest cosine similarity of `v` to any aspect, with that aspect's name.
    pub fn best_match(&self, v: &[f32]) -> Option<(&str, f32)> {
        self.aspects
            .iter()
            .map(|a| (a.name.as_str(), cosine_similarity(v, &a.centroid)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Save with bincode
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = bincode::serialize(self).map_err(|e| SummarizerError::Serialization(e.to_string()))?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Load and validate a bincode store.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let corrupt = |reason: String| SummarizerError::CorruptAspectStore {
            path: PathBuf::from(path),
            reason,
        };
        let store: Self = bincode::deserialize(&data).map_err(|e| corrupt(e.to_string()))?;
        store.validate().map_err(corrupt)?;
        tracing::info!(path = %path.display(), aspects = store.len(), model = %store.model, "loaded aspect store");
        Ok(store)
    }
}

/// Blend weights for cluster scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub title: f32,
    pub description: f32,
    pub aspect: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        // description = 4.0 reproduces the production setting; pending confirmation.
        Self {
            title: 0.3,
            description: 4.0,
            aspect: 0.3,
        }
    }
}

impl ScoringWeights {
    /// Weights applied when no description is present: title and aspect split evenly.
    pub const WITHOUT_DESCRIPTION: Self = Self {
        title: 0.5,
        description: 0.0,
        aspect: 0.5,
    };

    /// Configured weights when a description exists, the even split otherwise.
    pub fn resolve(configured: Self, has_description: bool) -> Self {
        if has_description {
            configured
        } else {
            Self::WITHOUT_DESCRIPTION
        }
    }
}

/// Relevance of one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterScore {
    pub members: Vec<usize>,
    pub title_similarity: f32,
    pub description_similarity: f32,
    pub aspect_similarity: f32,
    pub best_aspect: Option<String>,
    pub score: f32,
}

/// Score every non-empty cluster against the title, description and best-matching aspect.
pub fn score_clusters(
    embeddings: &[Vec<f32>],
    clusters: &[Vec<usize>],
    store: &AspectStore,
    title: &[f32],
    description: Option<&[f32]>,
    weights: ScoringWeights,
) -> Vec<ClusterScore> {
    clusters
        .iter()
        .filter(|members| !members.is_empty())
        .map(|members| {
            let c = centroid_of(embeddings, members);
            let title_similarity = cosine_similarity(&c, title);
            let description_similarity = description.map(|d| cosine_similarity(&c, d)).unwrap_or(0.0);
            let (best_aspect, aspect_similarity) = match store.best_match(&c) {
                Some((name, sim)) => (Some(name.to_string()), sim),
                None => (None, 0.0),
            };
            let score = weights.title * title_similarity
                + weights.description * description_similarity
                + weights.aspect * aspect_similarity;
            ClusterScore {
                members: members.clone(),
                title_similarity,
                description_similarity,
                aspect_similarity,
                best_aspect,
                score,
            }
        })
        .collect()
}

/// Keep every cluster scoring at or above the `aspect_percentile`-th percentile.
pub fn select_clusters(scores: Vec<ClusterScore>, aspect_percentile: f32) -> Selection<ClusterScore> {
    let values: Vec<f32> = scores.iter().map(|s| s.score).collect();
    let Some(cutoff) = percentile(&values, aspect_percentile) else {
        return Selection::Empty(EmptyReason::NoRelevantClusters);
    };
    let selected: Vec<ClusterScore> = scores.into_iter().filter(|s| s.score >= cutoff).collect();
    tracing::debug!(cutoff, selected = selected.len(), "aspect cluster selection");
    Selection::from_vec(selected, EmptyReason::NoRelevantClusters)
}

/// Per-aspect passage selection without clustering.
///
/// For each aspect, passages scoring at or above the `percentile`-th percentile
/// of their dot product with the aspect centroid are kept (only the `top_k`
/// best of them when set). The union is returned in ascending index order.
pub fn select_by_aspects(
    embeddings: &[Vec<f32>],
    store: &AspectStore,
    aspect_percentile: f32,
    top_k: Option<usize>,
) -> Selection<usize> {
    let mut selected = BTreeSet::new();
    for aspect in &store.aspects {
        let scores: Vec<f32> = embeddings.iter().map(|e| dot(e, &aspect.centroid)).collect();
        let mut candidates = select_at_or_above(&scores, aspect_percentile);
        if let Some(k) = top_k {
            if candidates.len() > k {
                candidates.sort_by(|a, b| {
                    scores[*b]
                        .partial_cmp(&scores[*a])
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.cmp(b))
                });
                candidates.truncate(k);
            }
        }
        selected.extend(candidates);
    }
    Selection::from_vec(selected.into_iter().collect(), EmptyReason::NoRelevantPassages)
}
