//! Centrality metrics
//!
//! Both metrics sit behind `CentralityMetric` so another approximation can
//! replace ego betweenness without touching callers.

use super::graph::CoauthorGraph;
use std::cmp::Ordering;

/// Per-author structural importance
pub trait CentralityMetric: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score of the author at `node`
    fn score(&self, graph: &CoauthorGraph, node: usize) -> f64;
}

/// Number of distinct co-authors
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeCentrality;

impl CentralityMetric for DegreeCentrality {
    fn name(&self) -> &'static str {
        "degree"
    }

    fn score(&self, graph: &CoauthorGraph, node: usize) -> f64 {
        graph.degree(node) as f64
    }
}

/// Ego-network bridging score.
///
/// For every pair of the author's neighbors that are not co-authors
/// themselves, adds 1 / (number of ego-network members adjacent to both).
/// The ego itself always counts, so a pair only the ego connects adds 1.
/// This is a local heuristic, not global shortest-path betweenness.
/// Authors with more than `sample_limit` neighbors keep the heaviest edges,
/// lower ids first on equal weight.
#[derive(Debug, Clone, Copy)]
pub struct EgoBetweenness {
    pub sample_limit: usize,
}

impl EgoBetweenness {
    pub fn new(sample_limit: usize) -> Self {
        Self {
            sample_limit: sample_limit.max(1),
        }
    }

    fn sample(&self, graph: &CoauthorGraph, node: usize) -> Vec<usize> {
        let mut neighbors = graph.neighbors(node).to_vec();
        if neighbors.len() > self.sample_limit {
            neighbors.sort_by(|(a, wa), (b, wb)| {
                wb.partial_cmp(wa).unwrap_or(Ordering::Equal).then(a.cmp(b))
            });
            neighbors.truncate(self.sample_limit);
        }
        let mut sampled: Vec<usize> = neighbors.into_iter().map(|(n, _)| n).collect();
        sampled.sort_unstable();
        sampled
    }
}

impl CentralityMetric for EgoBetweenness {
    fn name(&self) -> &'static str {
        "ego_betweenness"
    }

    fn score(&self, graph: &CoauthorGraph, node: usize) -> f64 {
        let ego = self.sample(graph, node);
        let mut total = 0.0;

        for (i, &u) in ego.iter().enumerate() {
            for &v in &ego[i + 1..] {
                if graph.are_adjacent(u, v) {
                    continue;
                }
                let brokers = 1 + ego
                    .iter()
                    .filter(|&&w| {
                        w != u && w != v && graph.are_adjacent(w, u) && graph.are_adjacent(w, v)
                    })
                    .count();
                total += 1.0 / brokers as f64;
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::super::graph::WeightCombiner;
    use super::*;
    use litgraph_common::graph::{Author, GraphSnapshot, Paper, SnapshotBuilder};
    use uuid::Uuid;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    /// One two-author paper per pair
    fn graph_of(authors: &[u128], pairs: &[(u128, u128)]) -> (GraphSnapshot, CoauthorGraph) {
        let mut builder = SnapshotBuilder::new("v1");
        for a in authors {
            builder.add_author(Author::new(id(*a), format!("Author {}", a)));
        }
        for (i, (a, b)) in pairs.iter().enumerate() {
            let paper = id(1_000 + i as u128);
            builder.add_paper(Paper::new(paper, "Shared"));
            builder.add_authorship(paper, id(*a), 0).unwrap();
            builder.add_authorship(paper, id(*b), 1).unwrap();
        }
        let snapshot = builder.build();
        let graph = CoauthorGraph::build(&snapshot, WeightCombiner::CountOnly);
        (snapshot, graph)
    }

    #[test]
    fn test_star_center_bridges_every_pair() {
        let (_, graph) = graph_of(&[1, 2, 3, 4], &[(1, 2), (1, 3), (1, 4)]);
        let metric = EgoBetweenness::new(64);
        assert_eq!(metric.score(&graph, 0), 3.0);
        assert_eq!(metric.score(&graph, 1), 0.0);
        assert_eq!(DegreeCentrality.score(&graph, 0), 3.0);
    }

    #[test]
    fn test_shared_broker_halves_contribution() {
        // 1 is ego; 2 and 3 are not co-authors but 4 links them
        let (_, graph) = graph_of(&[1, 2, 3, 4], &[(1, 2), (1, 3), (1, 4), (4, 2), (4, 3)]);
        let metric = EgoBetweenness::new(64);
        assert!((metric.score(&graph, 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_has_no_bridging() {
        let (_, graph) = graph_of(&[1, 2, 3], &[(1, 2), (2, 3), (1, 3)]);
        let metric = EgoBetweenness::new(64);
        for node in 0..3 {
            assert_eq!(metric.score(&graph, node), 0.0);
        }
    }

    #[test]
    fn test_sampling_limits_neighbors() {
        let (_, graph) = graph_of(&[1, 2, 3, 4, 5], &[(1, 2), (1, 3), (1, 4), (1, 5)]);
        // Two sampled neighbors leave a single unconnected pair
        assert_eq!(EgoBetweenness::new(2).score(&graph, 0), 1.0);
        assert_eq!(EgoBetweenness::new(64).score(&graph, 0), 6.0);
    }
}
