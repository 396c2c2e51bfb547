//! Dense citation index
//!
//! Re-indexes the snapshot's citation edges by position so propagation can
//! run over plain vectors. Edges whose endpoints are missing from the
//! snapshot are left out and remembered as gaps.

use chrono::NaiveDate;
use litgraph_common::graph::{CitationType, GraphStore, PaperId};
use std::collections::{BTreeSet, HashMap};

/// In-memory citation graph over snapshot positions
pub struct CitationIndex {
    /// Paper ids, ascending
    ids: Vec<PaperId>,

    /// Reverse lookup: paper_id -> position
    position: HashMap<PaperId, usize>,

    published_on: Vec<Option<NaiveDate>>,

    /// Reverse adjacency: position -> (citing position, edge weight)
    incoming: Vec<Vec<(usize, f64)>>,

    /// Number of resolved references per paper
    out_degree: Vec<usize>,

    edge_count: usize,

    /// Ids referenced by edges but absent from the snapshot
    missing: BTreeSet<PaperId>,

    skipped_edges: usize,
}

impl CitationIndex {
    /// Build the index, weighting each edge by its citation type
    pub fn build(store: &dyn GraphStore, weight: impl Fn(CitationType) -> f64) -> Self {
        let papers = store.papers();
        let ids: Vec<PaperId> = papers.iter().map(|p| p.id).collect();
        let published_on = papers.iter().map(|p| p.published_on).collect();
        let position: HashMap<PaperId, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut incoming = vec![Vec::new(); ids.len()];
        let mut out_degree = vec![0usize; ids.len()];
        let mut missing = BTreeSet::new();
        let mut edge_count = 0;
        let mut skipped_edges = 0;

        for edge in store.citations() {
            let citing = position.get(&edge.citing_id).copied();
            let cited = position.get(&edge.cited_id).copied();
            match (citing, cited) {
                (Some(citing), Some(cited)) => {
                    incoming[cited].push((citing, weight(edge.citation_type)));
                    out_degree[citing] += 1;
                    edge_count += 1;
                }
                _ => {
                    if citing.is_none() {
                        missing.insert(edge.citing_id);
                    }
                    if cited.is_none() {
                        missing.insert(edge.cited_id);
                    }
                    skipped_edges += 1;
                }
            }
        }

        for list in incoming.iter_mut() {
            list.sort_by_key(|(citing, _)| *citing);
        }

        Self {
            ids,
            position,
            published_on,
            incoming,
            out_degree,
            edge_count,
            missing,
            skipped_edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn id(&self, index: usize) -> PaperId {
        self.ids[index]
    }

    pub fn index_of(&self, id: PaperId) -> Option<usize> {
        self.position.get(&id).copied()
    }

    pub fn published_on(&self, index: usize) -> Option<NaiveDate> {
        self.published_on[index]
    }

    /// Papers citing this one, with edge weights
    pub fn citations(&self, index: usize) -> &[(usize, f64)] {
        &self.incoming[index]
    }

    /// Get citation count (incoming edges)
    pub fn citation_count(&self, index: usize) -> usize {
        self.incoming[index].len()
    }

    /// Get reference count (outgoing edges)
    pub fn reference_count(&self, index: usize) -> usize {
        self.out_degree[index]
    }

    pub fn missing_endpoints(&self) -> &BTreeSet<PaperId> {
        &self.missing
    }

    pub fn skipped_edges(&self) -> usize {
        self.skipped_edges
    }
}
