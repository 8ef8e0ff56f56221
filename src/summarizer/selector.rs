//! Intra-cluster passage selection.
//!
//! Centrality keeps the passages closest to their cluster centroid; isolation
//! keeps the passages with no near-duplicate inside their cluster. The two
//! have opposite biases and are reported separately.

use super::percentile::select_at_or_above;
use super::vector::{centroid_of, cosine_similarity, dot};

/// Knobs shared by both selection modes.
#[derive(Debug, Clone, Copy)]
pub struct SelectionOptions {
    pub centrality_percentile: f32,
    pub isolation_threshold: f32,
    /// Clusters with at most this many members are kept whole.
    pub tiny_cluster_size: usize,
}

/// Passage indices chosen from a set of clusters by each mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSelections {
    pub centrality: Vec<usize>,
    pub isolation: Vec<usize>,
    /// Clusters that bypassed filtering because of their size
    pub tiny_clusters: usize,
}

/// Members whose similarity to the cluster centroid reaches the percentile.
pub fn select_central(
    embeddings: &[Vec<f32>],
    members: &[usize],
    centrality_percentile: f32,
    tiny_cluster_size: usize,
) -> Vec<usize> {
    if members.len() <= tiny_cluster_size {
        return members.to_vec();
    }
    let c = centroid_of(embeddings, members);
    let sims: Vec<f32> = members
        .iter()
        .map(|&i| cosine_similarity(&embeddings[i], &c))
        .collect();
    select_at_or_above(&sims, centrality_percentile)
        .into_iter()
        .map(|k| members[k])
        .collect()
}

/// Members whose similarity to every other member is below `threshold`.
pub fn select_isolated(
    embeddings: &[Vec<f32>],
    members: &[usize],
    threshold: f32,
    tiny_cluster_size: usize,
) -> Vec<usize> {
    if members.len() <= tiny_cluster_size {
        return members.to_vec();
    }
    members
        .iter()
        .enumerate()
        .filter(|(a, &i)| {
            members
                .iter()
                .enumerate()
                .filter(|(b, _)| b != a)
                .all(|(_, &j)| dot(&embeddings[i], &embeddings[j]) < threshold)
        })
        .map(|(_, &i)| i)
        .collect()
}

/// Run both modes over every cluster.
pub fn select_passages(
    embeddings: &[Vec<f32>],
    clusters: &[Vec<usize>],
    options: SelectionOptions,
) -> ClusterSelections {
    let mut out = ClusterSelections::default();
    for members in clusters.iter().filter(|m| !m.is_empty()) {
        if members.len() <= options.tiny_cluster_size {
            out.tiny_clusters += 1;
        }
        out.centrality.extend(select_central(
            embeddings,
            members,
            options.centrality_percentile,
            options.tiny_cluster_size,
        ));
        out.isolation.extend(select_isolated(
            embeddings,
            members,
            options.isolation_threshold,
            options.tiny_cluster_size,
        ));
    }
    tracing::debug!(
        centrality = out.centrality.len(),
        isolation = out.isolation.len(),
        tiny = out.tiny_clusters,
        "passage selection"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::vector::normalize;

    fn unit(v: &[f32]) -> Vec<f32> {
        let mut v = v.to_vec();
        normalize(&mut v);
        v
    }

    fn options() -> SelectionOptions {
        SelectionOptions {
            centrality_percentile: 80.0,
            isolation_threshold: 0.5,
            tiny_cluster_size: 1,
        }
    }

    #[test]
    fn test_singleton_cluster_always_kept() {
        let embeddings = vec![unit(&[1.0, 0.0])];
        let sel = select_passages(&embeddings, &[vec![0]], options());
        assert_eq!(sel.centrality, vec![0]);
        assert_eq!(sel.isolation, vec![0]);
        assert_eq!(sel.tiny_clusters, 1);
    }

    #[test]
    fn test_tiny_cluster_bypass_threshold() {
        let embeddings = vec![unit(&[1.0, 0.0]), unit(&[0.0, 1.0]), unit(&[1.0, 1.0])];
        let members = vec![0, 1, 2];
        assert_eq!(select_central(&embeddings, &members, 100.0, 3), members);
        assert_eq!(select_isolated(&embeddings, &members, -1.0, 3), members);
    }

    #[test]
    fn test_centrality_prefers_central_member() {
        let embeddings = vec![
            unit(&[1.0, 0.0]),
            unit(&[1.0, 1.0]),
            unit(&[0.0, 1.0]),
            unit(&[5.0, 0.0]),
        ];
        // The centroid leans towards x, the diagonal member sits closest to it.
        let picked = select_central(&embeddings, &[0, 1, 2, 3], 80.0, 1);
        assert_eq!(picked, vec![1]);

        let half = select_central(&embeddings, &[0, 1, 2, 3], 50.0, 1);
        assert_eq!(half, vec![0, 1, 3]);
    }

    #[test]
    fn test_isolation_drops_near_duplicates() {
        let embeddings = vec![
            unit(&[1.0, 0.0, 0.0]),
            unit(&[0.99, 0.05, 0.0]),
            unit(&[0.0, 0.0, 1.0]),
        ];
        let picked = select_isolated(&embeddings, &[0, 1, 2], 0.5, 1);
        assert_eq!(picked, vec![2]);
    }

    #[test]
    fn test_modes_are_reported_separately() {
        let embeddings = vec![
            unit(&[1.0, 0.0, 0.0]),
            unit(&[0.99, 0.05, 0.0]),
            unit(&[0.0, 0.0, 1.0]),
        ];
        let sel = select_passages(&embeddings, &[vec![0, 1, 2]], options());
        assert_eq!(sel.isolation, vec![2]);
        assert!(!sel.centrality.contains(&2));
        assert_eq!(sel.tiny_clusters, 0);
    }
}
