//! Label propagation communities
//!
//! Every author starts in its own community. Authors are visited in
//! ascending id order and adopt the label carrying the most edge weight
//! among their neighbors, the lowest label on ties. Updates apply
//! immediately. The loop ends after a pass without changes or at the cap.

use super::graph::CoauthorGraph;
use crate::deadline::Deadline;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct LabelPropagation {
    pub max_iterations: usize,
}

/// Community per author position, numbered by lowest member
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityAssignment {
    pub labels: Vec<usize>,
    pub community_count: usize,
    pub iterations: usize,
    pub converged: bool,
    pub timed_out: bool,
    /// Labels changed in the last completed pass
    pub last_changes: usize,
}

impl LabelPropagation {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    pub fn run(&self, graph: &CoauthorGraph, deadline: &Deadline) -> CommunityAssignment {
        let n = graph.node_count();
        let mut labels: Vec<usize> = (0..n).collect();
        let mut iterations = 0;
        let mut converged = false;
        let mut timed_out = false;
        let mut last_changes = 0;

        while iterations < self.max_iterations {
            if deadline.is_expired() {
                timed_out = true;
                break;
            }

            let mut changes = 0;
            for node in 0..n {
                let neighbors = graph.neighbors(node);
                if neighbors.is_empty() {
                    continue;
                }

                let mut tally: BTreeMap<usize, f64> = BTreeMap::new();
                for &(neighbor, weight) in neighbors {
                    *tally.entry(labels[neighbor]).or_insert(0.0) += weight;
                }

                // Ascending labels: strict comparison keeps the lowest on ties
                let mut best = labels[node];
                let mut best_weight = f64::NEG_INFINITY;
                for (label, weight) in tally {
                    if weight > best_weight {
                        best = label;
                        best_weight = weight;
                    }
                }

                if best != labels[node] {
                    labels[node] = best;
                    changes += 1;
                }
            }

            iterations += 1;
            last_changes = changes;
            if changes == 0 {
                converged = true;
                break;
            }
        }

        let (labels, community_count) = renumber(&labels);
        CommunityAssignment {
            labels,
            community_count,
            iterations,
            converged,
            timed_out,
            last_changes,
        }
    }
}

/// Renumber labels 0.. in order of each community's lowest position
fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let renumbered = labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}
