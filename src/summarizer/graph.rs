//! Passage similarity graph.

use super::percentile::percentile;
use super::vector::dot;

/// Weighted undirected graph over passage indices `[0, node_count)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityGraph {
    node_count: usize,
    /// `(i, j, weight)` with `i < j`, ordered by `(i, j)`.
    edges: Vec<(usize, usize, f32)>,
}

impl SimilarityGraph {
    /// A graph with `node_count` nodes and no edges.
    pub fn empty(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
        }
    }

    /// Build from an explicit edge list. Self-loops and non-positive weights are dropped.
    pub fn from_edges(node_count: usize, edges: impl IntoIterator<Item = (usize, usize, f32)>) -> Self {
        let mut edges: Vec<(usize, usize, f32)> = edges
            .into_iter()
            .filter(|(i, j, w)| i != j && *w > 0.0 && *i < node_count && *j < node_count)
            .map(|(i, j, w)| if i < j { (i, j, w) } else { (j, i, w) })
            .collect();
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        edges.dedup_by(|a, b| a.0 == b.0 && a.1 == b.1);
        Self { node_count, edges }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[(usize, usize, f32)] {
        &self.edges
    }

    /// Adjacency lists, both directions, neighbors in ascending order.
    pub fn adjacency(&self) -> Vec<Vec<(usize, f64)>> {
        let mut adj = vec![Vec::new(); self.node_count];
        for &(i, j, w) in &self.edges {
            adj[i].push((j, f64::from(w)));
            adj[j].push((i, f64::from(w)));
        }
        for list in adj.iter_mut() {
            list.sort_by_key(|(n, _)| *n);
        }
        adj
    }
}

/// Connect passages whose cosine similarity reaches the `edge_percentile`-th
/// percentile of all positive pairwise similarities.
///
/// Embeddings are expected to be unit length, so similarity is the dot product.
/// If no pair has positive similarity the graph has no edges.
pub fn build_similarity_graph(embeddings: &[Vec<f32>], edge_percentile: f32) -> SimilarityGraph {
    let n = embeddings.len();
    let mut pairs = Vec::with_capacity(n.saturating_sub(1) * n / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            // Re-normalized vectors can overshoot 1.0 by rounding.
            pairs.push((i, j, dot(&embeddings[i], &embeddings[j]).min(1.0)));
        }
    }

    let population: Vec<f32> = pairs.iter().map(|p| p.2).filter(|s| *s > 0.0).collect();
    let Some(cutoff) = percentile(&population, edge_percentile) else {
        return SimilarityGraph::empty(n);
    };

    let edges = pairs.into_iter().filter(|(_, _, s)| *s > 0.0 && *s >= cutoff);
    let graph = SimilarityGraph::from_edges(n, edges);
    tracing::debug!(
        nodes = n,
        edges = graph.edge_count(),
        cutoff,
        "built similarity graph"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(v: &[f32]) -> Vec<f32> {
        let mut v = v.to_vec();
        crate::summarizer::vector::normalize(&mut v);
        v
    }

    #[test]
    fn test_single_node_has_no_edges() {
        let g = build_similarity_graph(&[unit(&[1.0, 0.0])], 75.0);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_orthogonal_vectors_have_no_edges() {
        let rows = vec![unit(&[1.0, 0.0, 0.0]), unit(&[0.0, 1.0, 0.0]), unit(&[0.0, 0.0, 1.0])];
        let g = build_similarity_graph(&rows, 0.0);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_percentile_cutoff_keeps_strongest_pairs() {
        let rows = vec![
            unit(&[1.0, 0.0]),
            unit(&[0.99, 0.1]),
            unit(&[0.7, 0.7]),
            unit(&[0.1, 1.0]),
        ];
        let all = build_similarity_graph(&rows, 0.0);
        assert_eq!(all.edge_count(), 6);

        let top = build_similarity_graph(&rows, 100.0);
        assert_eq!(top.edge_count(), 1);
        assert_eq!((top.edges()[0].0, top.edges()[0].1), (0, 1));
        for &(_, _, w) in top.edges() {
            assert!(w > 0.0 && w <= 1.0);
        }
    }

    #[test]
    fn test_from_edges_normalizes_pairs() {
        let g = SimilarityGraph::from_edges(3, vec![(2, 0, 0.5), (0, 2, 0.5), (1, 1, 0.9), (0, 1, 0.0)]);
        assert_eq!(g.edges(), &[(0, 2, 0.5)]);
        let adj = g.adjacency();
        assert_eq!(adj[0], vec![(2, 0.5)]);
        assert_eq!(adj[2], vec![(0, 0.5)]);
        assert!(adj[1].is_empty());
    }

    #[test]
    fn test_weights_never_exceed_one() {
        // Slightly over-long rows stand in for rounding after normalization.
        let rows = vec![vec![0.6, 0.8000001], vec![0.6, 0.8000001], vec![0.6000001, 0.8]];
        let g = build_similarity_graph(&rows, 0.0);
        assert_eq!(g.edge_count(), 3);
        for &(_, _, w) in g.edges() {
            assert!(w > 0.0 && w <= 1.0);
        }
    }
}
