//! Selection over the money-passage stream.
//!
//! Money passages skip the graph entirely: every passage is compared with the
//! centroid of all of them and the most typical ones are kept.

use super::percentile::select_at_or_above;
use super::vector::{centroid, cosine_similarity};

/// Indices of money passages whose similarity to the global centroid reaches
/// the `pricing_percentile`-th percentile. A percentile of 0 keeps everything.
pub fn select_pricing(embeddings: &[Vec<f32>], pricing_percentile: f32) -> Vec<usize> {
    if embeddings.is_empty() {
        return Vec::new();
    }
    let c = centroid(embeddings);
    let sims: Vec<f32> = embeddings.iter().map(|e| cosine_similarity(e, &c)).collect();
    let selected = select_at_or_above(&sims, pricing_percentile);
    tracing::debug!(
        money_passages = embeddings.len(),
        selected = selected.len(),
        "pricing selection"
    );
    selected
}
