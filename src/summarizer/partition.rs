//! Community detection over the passage similarity graph.
//!
//! The rest of the pipeline only depends on [`Partitioner`]. The default
//! implementation is a seeded Louvain method: greedy local moves that raise
//! weighted modularity, followed by aggregation of each community into a
//! single node, repeated until nothing improves.

use super::graph::SimilarityGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Minimum modularity improvement for another local-move pass.
const MIN_GAIN: f64 = 1e-7;

/// Splits a graph into communities.
///
/// Implementations must return a partition of `[0, node_count)`: every node in
/// exactly one non-empty cluster, isolated nodes as singletons. Results must be
/// deterministic for a given graph and configuration.
pub trait Partitioner: Send + Sync {
    fn partition(&self, graph: &SimilarityGraph) -> Vec<Vec<usize>>;
}

/// Louvain modularity maximization with a fixed shuffle seed.
#[derive(Debug, Clone, Copy)]
pub struct LouvainPartitioner {
    pub seed: u64,
}

impl LouvainPartitioner {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for LouvainPartitioner {
    fn default() -> Self {
        Self::new(42)
    }
}

impl Partitioner for LouvainPartitioner {
    fn partition(&self, graph: &SimilarityGraph) -> Vec<Vec<usize>> {
        let n = graph.node_count();
        let mut membership: Vec<usize> = (0..n).collect();
        if graph.edge_count() == 0 {
            return group(&membership);
        }

        let mut level = Level::from_graph(graph);
        let mut rng = StdRng::seed_from_u64(self.seed);

        while let Some((community, count)) = level.local_moves(&mut rng) {
            for m in membership.iter_mut() {
                *m = community[*m];
            }
            if count == level.len() {
                break;
            }
            level = level.aggregate(&community, count);
        }

        group(&membership)
    }
}

/// Weighted modularity of `clusters` on `graph`. Zero for edgeless graphs.
pub fn modularity(graph: &SimilarityGraph, clusters: &[Vec<usize>]) -> f64 {
    let mut community = vec![0; graph.node_count()];
    for (c, members) in clusters.iter().enumerate() {
        for &node in members {
            community[node] = c;
        }
    }
    let level = Level::from_graph(graph);
    level.modularity(&community, clusters.len())
}

/// One aggregation level: nodes are communities of the level below.
struct Level {
    /// Neighbors (never self) with summed edge weight.
    adj: Vec<Vec<(usize, f64)>>,
    /// Weight internal to each node, every edge counted once.
    loops: Vec<f64>,
}

impl Level {
    fn from_graph(graph: &SimilarityGraph) -> Self {
        Self {
            adj: graph.adjacency(),
            loops: vec![0.0; graph.node_count()],
        }
    }

    fn len(&self) -> usize {
        self.adj.len()
    }

    fn degrees(&self) -> Vec<f64> {
        self.adj
            .iter()
            .zip(self.loops.iter())
            .map(|(links, inner)| 2.0 * inner + links.iter().map(|(_, w)| w).sum::<f64>())
            .collect()
    }

    fn modularity(&self, community: &[usize], count: usize) -> f64 {
        let degrees = self.degrees();
        let two_m: f64 = degrees.iter().sum();
        if two_m == 0.0 {
            return 0.0;
        }

        let mut inside = vec![0.0; count];
        let mut total = vec![0.0; count];
        for i in 0..self.len() {
            let c = community[i];
            total[c] += degrees[i];
            inside[c] += self.loops[i];
            for &(j, w) in &self.adj[i] {
                if community[j] == c {
                    inside[c] += w / 2.0;
                }
            }
        }

        inside
            .iter()
            .zip(total.iter())
            .map(|(inner, tot)| 2.0 * inner / two_m - (tot / two_m).powi(2))
            .sum()
    }

    /// Move nodes between neighboring communities while modularity improves.
    ///
    /// Returns the renumbered community of every node and the community count,
    /// or `None` if no node moved.
    fn local_moves(&self, rng: &mut StdRng) -> Option<(Vec<usize>, usize)> {
        let n = self.len();
        let degrees = self.degrees();
        let two_m: f64 = degrees.iter().sum();
        if two_m == 0.0 {
            return None;
        }

        let mut community: Vec<usize> = (0..n).collect();
        let mut total = degrees.clone();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut moved_any = false;
        let mut current = self.modularity(&community, n);

        loop {
            let mut moved = false;
            for &i in &order {
                let own = community[i];
                let k_i = degrees[i];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(j, w) in &self.adj[i] {
                    *links.entry(community[j]).or_insert(0.0) += w;
                }

                total[own] -= k_i;
                let mut best = own;
                let mut best_gain = gain(links.get(&own).copied().unwrap_or(0.0), total[own], k_i, two_m);
                for (&c, &k_in) in &links {
                    let g = gain(k_in, total[c], k_i, two_m);
                    if g > best_gain {
                        best = c;
                        best_gain = g;
                    }
                }
                total[best] += k_i;

                if best != own {
                    community[i] = best;
                    moved = true;
                }
            }

            if !moved {
                break;
            }
            moved_any = true;

            let next = self.modularity(&community, n);
            if next - current < MIN_GAIN {
                break;
            }
            current = next;
        }

        if !moved_any {
            return None;
        }
        Some(renumber(&community))
    }

    /// Collapse each community into one node.
    fn aggregate(&self, community: &[usize], count: usize) -> Level {
        let mut loops = vec![0.0; count];
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];

        for i in 0..self.len() {
            let a = community[i];
            loops[a] += self.loops[i];
            for &(j, w) in &self.adj[i] {
                let b = community[j];
                if a == b {
                    // Seen once from each endpoint.
                    loops[a] += w / 2.0;
                } else {
                    *links[a].entry(b).or_insert(0.0) += w;
                }
            }
        }

        Level {
            adj: links.into_iter().map(|m| m.into_iter().collect()).collect(),
            loops,
        }
    }
}

/// Modularity gain (up to a constant factor) of inserting a node with degree
/// `k_i` into a community it shares `k_in` edge weight with.
fn gain(k_in: f64, community_total: f64, k_i: f64, two_m: f64) -> f64 {
    k_in - community_total * k_i / two_m
}

/// Relabel communities `0..count` in order of first appearance.
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut labels: BTreeMap<usize, usize> = BTreeMap::new();
    let mut out = Vec::with_capacity(community.len());
    for &c in community {
        let next = labels.len();
        out.push(*labels.entry(c).or_insert(next));
    }
    (out, labels.len())
}

/// Membership vector to clusters, ordered by smallest member.
fn group(membership: &[usize]) -> Vec<Vec<usize>> {
    let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (node, &c) in membership.iter().enumerate() {
        clusters.entry(c).or_default().push(node);
    }
    let mut out: Vec<Vec<usize>> = clusters.into_values().collect();
    out.sort_by_key(|members| members[0]);
    out
}
