//! Co-authorship graph
//!
//! One undirected edge per co-authoring pair, stored canonically as
//! (smaller id, larger id) with shared-paper count, citation total and the
//! date range of the shared papers.

use chrono::NaiveDate;
use litgraph_common::graph::{AuthorId, GraphStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How shared-paper count and impact combine into an edge weight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightCombiner {
    /// count + sum of citation counts of the shared papers
    #[default]
    CountPlusCitations,

    /// count only
    CountOnly,

    /// count * (1 + ln(1 + sum of citation counts))
    LogImpact,
}

impl WeightCombiner {
    pub fn combine(&self, shared_papers: u32, citations: u64) -> f64 {
        let count = f64::from(shared_papers);
        match self {
            WeightCombiner::CountPlusCitations => count + citations as f64,
            WeightCombiner::CountOnly => count,
            WeightCombiner::LogImpact => count * (1.0 + (citations as f64).ln_1p()),
        }
    }
}

/// Derived co-authorship edge; `author1_id < author2_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationEdge {
    pub author1_id: AuthorId,
    pub author2_id: AuthorId,
    pub shared_papers: u32,
    pub citation_total: u64,
    pub first_shared: Option<NaiveDate>,
    pub last_shared: Option<NaiveDate>,
    pub weight: f64,
}

/// Order a pair as (min, max)
pub fn canonical_pair(a: AuthorId, b: AuthorId) -> (AuthorId, AuthorId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Default)]
struct EdgeAccumulator {
    shared_papers: u32,
    citation_total: u64,
    first_shared: Option<NaiveDate>,
    last_shared: Option<NaiveDate>,
}

/// Weighted undirected co-authorship graph over snapshot positions
pub struct CoauthorGraph {
    /// Author ids, ascending
    authors: Vec<AuthorId>,

    position: HashMap<AuthorId, usize>,

    /// position -> (neighbor position, weight), ordered by neighbor
    adjacency: Vec<Vec<(usize, f64)>>,

    edges: Vec<CollaborationEdge>,

    /// Authorships pointing at authors absent from the snapshot
    missing_authors: BTreeSet<AuthorId>,
}

impl CoauthorGraph {
    pub fn build(store: &dyn GraphStore, combiner: WeightCombiner) -> Self {
        let authors: Vec<AuthorId> = store.authors().iter().map(|a| a.id).collect();
        let position: HashMap<AuthorId, usize> =
            authors.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut pairs: BTreeMap<(AuthorId, AuthorId), EdgeAccumulator> = BTreeMap::new();
        let mut missing_authors = BTreeSet::new();

        for paper in store.papers() {
            let Ok(authorships) = store.authors_of(paper.id) else {
                continue;
            };

            let mut byline = BTreeSet::new();
            for authorship in authorships {
                if position.contains_key(&authorship.author_id) {
                    byline.insert(authorship.author_id);
                } else {
                    missing_authors.insert(authorship.author_id);
                }
            }

            let byline: Vec<AuthorId> = byline.into_iter().collect();
            for (i, a) in byline.iter().enumerate() {
                for b in &byline[i + 1..] {
                    let acc = pairs.entry(canonical_pair(*a, *b)).or_default();
                    acc.shared_papers += 1;
                    acc.citation_total += u64::from(paper.citation_count);
                    if let Some(date) = paper.published_on {
                        acc.first_shared = Some(acc.first_shared.map_or(date, |d| d.min(date)));
                        acc.last_shared = Some(acc.last_shared.map_or(date, |d| d.max(date)));
                    }
                }
            }
        }

        let mut adjacency = vec![Vec::new(); authors.len()];
        let edges: Vec<CollaborationEdge> = pairs
            .into_iter()
            .map(|((a, b), acc)| {
                let weight = combiner.combine(acc.shared_papers, acc.citation_total);
                let (ia, ib) = (position[&a], position[&b]);
                adjacency[ia].push((ib, weight));
                adjacency[ib].push((ia, weight));
                CollaborationEdge {
                    author1_id: a,
                    author2_id: b,
                    shared_papers: acc.shared_papers,
                    citation_total: acc.citation_total,
                    first_shared: acc.first_shared,
                    last_shared: acc.last_shared,
                    weight,
                }
            })
            .collect();

        for list in adjacency.iter_mut() {
            list.sort_by_key(|(neighbor, _)| *neighbor);
        }

        Self {
            authors,
            position,
            adjacency,
            edges,
            missing_authors,
        }
    }

    pub fn node_count(&self) -> usize {
        self.authors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges ordered by (author1_id, author2_id)
    pub fn edges(&self) -> &[CollaborationEdge] {
        &self.edges
    }

    pub fn author_id(&self, index: usize) -> AuthorId {
        self.authors[index]
    }

    pub fn index_of(&self, id: AuthorId) -> Option<usize> {
        self.position.get(&id).copied()
    }

    pub fn neighbors(&self, index: usize) -> &[(usize, f64)] {
        &self.adjacency[index]
    }

    pub fn degree(&self, index: usize) -> usize {
        self.adjacency[index].len()
    }

    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacency[a]
            .binary_search_by_key(&b, |(neighbor, _)| *neighbor)
            .is_ok()
    }

    pub fn missing_authors(&self) -> &BTreeSet<AuthorId> {
        &self.missing_authors
    }
}
