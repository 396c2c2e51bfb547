//! Collaboration network analysis
//!
//! Builds the co-authorship graph from a snapshot and reports, per author:
//! degree centrality, approximate (ego-network) betweenness, a label
//! propagation community and the number of distinct affiliations among
//! co-authors.

mod centrality;
mod community;
mod graph;

pub use centrality::{CentralityMetric, DegreeCentrality, EgoBetweenness};
pub use community::{CommunityAssignment, LabelPropagation};
pub use graph::{canonical_pair, CoauthorGraph, CollaborationEdge, WeightCombiner};

use crate::deadline::Deadline;
use crate::outcome::{Outcome, Warning};
use litgraph_common::errors::Result;
use litgraph_common::graph::{AuthorId, GraphStore};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};
use validator::Validate;

/// Authors scored per deadline check
const AUTHOR_CHUNK: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CollaborationParams {
    #[serde(default)]
    pub combiner: WeightCombiner,

    #[validate(range(min = 1))]
    pub max_label_iterations: usize,

    #[validate(range(min = 1))]
    pub ego_sample_limit: usize,
}

impl Default for CollaborationParams {
    fn default() -> Self {
        Self {
            combiner: WeightCombiner::default(),
            max_label_iterations: 20,
            ego_sample_limit: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorMetrics {
    pub author_id: AuthorId,

    /// Distinct co-authors
    pub degree_centrality: usize,

    /// Degree divided by (authors - 1)
    pub normalized_degree: f64,

    pub betweenness_score: f64,

    pub community_id: usize,

    /// Distinct affiliations among co-authors
    pub affiliation_diversity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySummary {
    pub community_id: usize,
    pub size: usize,
    pub members: Vec<AuthorId>,
    /// Total weight of edges with both ends inside the community
    pub internal_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationMetrics {
    /// Per-author metrics ordered by author id
    pub authors: Vec<AuthorMetrics>,
    pub communities: Vec<CommunitySummary>,
    pub edge_count: usize,
    pub label_iterations: usize,
    pub converged: bool,
}

/// Collaboration analysis over one snapshot
pub struct CollaborationNetwork<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> CollaborationNetwork<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    pub fn compute(
        &self,
        params: &CollaborationParams,
        deadline: &Deadline,
    ) -> Result<Outcome<CollaborationMetrics>> {
        params.validate()?;

        let graph = CoauthorGraph::build(self.store, params.combiner);
        let mut warnings = Vec::new();
        for missing in graph.missing_authors() {
            warn!(author_id = %missing, "Authorship references an author absent from the snapshot");
            warnings.push(Warning::data_gap(
                "author",
                missing,
                "author absent; authorship skipped",
            ));
        }

        let communities = LabelPropagation::new(params.max_label_iterations).run(&graph, deadline);
        if communities.timed_out {
            warnings.push(Warning::timeout(
                "label_propagation",
                communities.iterations,
                params.max_label_iterations,
            ));
        } else if !communities.converged {
            debug!(iterations = communities.iterations, "Label propagation hit its iteration cap");
            warnings.push(Warning::convergence(
                "label_propagation",
                communities.iterations,
                communities.last_changes as f64,
            ));
        }

        let degree = score_all(&DegreeCentrality, &graph, &Deadline::none()).0;
        let ego = EgoBetweenness::new(params.ego_sample_limit);
        let (betweenness, completed) = score_all(&ego, &graph, deadline);
        if completed < graph.node_count() {
            warn!(completed, total = graph.node_count(), "Betweenness scoring hit the deadline");
            warnings.push(Warning::timeout("ego_betweenness", completed, graph.node_count()));
        }

        let n = graph.node_count();
        let authors: Vec<AuthorMetrics> = (0..completed)
            .map(|node| AuthorMetrics {
                author_id: graph.author_id(node),
                degree_centrality: graph.degree(node),
                normalized_degree: if n > 1 { degree[node] / (n - 1) as f64 } else { 0.0 },
                betweenness_score: betweenness[node],
                community_id: communities.labels[node],
                affiliation_diversity: self.affiliation_diversity(&graph, node),
            })
            .collect();

        let summaries = summarize_communities(&graph, &communities);
        debug!(
            authors = n,
            edges = graph.edge_count(),
            communities = summaries.len(),
            "Collaboration metrics computed"
        );

        Ok(Outcome::with_warnings(
            CollaborationMetrics {
                authors,
                communities: summaries,
                edge_count: graph.edge_count(),
                label_iterations: communities.iterations,
                converged: communities.converged,
            },
            warnings,
        ))
    }

    fn affiliation_diversity(&self, graph: &CoauthorGraph, node: usize) -> usize {
        graph
            .neighbors(node)
            .iter()
            .filter_map(|(neighbor, _)| self.store.author(graph.author_id(*neighbor)).ok())
            .filter_map(|author| author.affiliation.as_deref())
            .map(str::trim)
            .filter(|affiliation| !affiliation.is_empty())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Score authors in chunks until done or the deadline passes; returns the
/// scores and how many leading authors were scored
fn score_all(
    metric: &dyn CentralityMetric,
    graph: &CoauthorGraph,
    deadline: &Deadline,
) -> (Vec<f64>, usize) {
    let nodes: Vec<usize> = (0..graph.node_count()).collect();
    let mut scores = Vec::with_capacity(nodes.len());

    for chunk in nodes.chunks(AUTHOR_CHUNK) {
        if deadline.is_expired() {
            break;
        }
        let chunk_scores: Vec<f64> = chunk
            .par_iter()
            .map(|&node| metric.score(graph, node))
            .collect();
        scores.extend(chunk_scores);
    }

    debug!(metric = metric.name(), scored = scores.len(), "Centrality scored");
    let completed = scores.len();
    (scores, completed)
}

fn summarize_communities(
    graph: &CoauthorGraph,
    assignment: &CommunityAssignment,
) -> Vec<CommunitySummary> {
    let mut summaries: Vec<CommunitySummary> = (0..assignment.community_count)
        .map(|community_id| CommunitySummary {
            community_id,
            size: 0,
            members: Vec::new(),
            internal_weight: 0.0,
        })
        .collect();

    for (node, community) in assignment.labels.iter().enumerate() {
        let summary = &mut summaries[*community];
        summary.size += 1;
        summary.members.push(graph.author_id(node));
    }

    for edge in graph.edges() {
        let (Some(a), Some(b)) = (
            graph.index_of(edge.author1_id),
            graph.index_of(edge.author2_id),
        ) else {
            continue;
        };
        if assignment.labels[a] == assignment.labels[b] {
            summaries[assignment.labels[a]].internal_weight += edge.weight;
        }
    }

    summaries
}
