//! Citation influence ranking
//!
//! Bounded damped propagation over the citation graph. Scores are reported
//! both raw and normalized by the number of resolved citation edges.

mod graph;
mod propagation;

pub use graph::CitationIndex;
pub use propagation::{InfluenceParams, PropagationMode};

use crate::deadline::Deadline;
use crate::outcome::{Outcome, Warning};
use litgraph_common::errors::{AppError, Result};
use litgraph_common::graph::{GraphStore, PaperId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Paper with its influence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceScore {
    pub paper_id: PaperId,

    /// Raw score divided by the number of citation edges
    pub score: f64,

    /// Un-normalized propagated score
    pub raw_score: f64,

    /// Direct citations counted at iteration 0
    pub direct_citations: usize,

    /// Last iteration at which this paper's score increased
    pub depth_reached: usize,

    /// Whether propagation stabilized before the depth bound
    pub converged: bool,
}

/// Ranked influence output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceRanking {
    pub scores: Vec<InfluenceScore>,
    pub iterations: usize,
    pub converged: bool,
    pub total_edges: usize,
    pub mode: PropagationMode,
}

/// Influence engine over one snapshot
pub struct InfluenceEngine<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> InfluenceEngine<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    /// Compute and rank influence scores
    pub fn compute(
        &self,
        params: &InfluenceParams,
        deadline: &Deadline,
    ) -> Result<Outcome<InfluenceRanking>> {
        params.check()?;

        let index = CitationIndex::build(self.store, |t| params.weight(t));
        let seeds = self.resolve_seeds(&index, params.seeds.as_deref())?;

        let mut warnings = Vec::new();
        for missing in index.missing_endpoints() {
            warn!(paper_id = %missing, "Citation edge references a paper absent from the snapshot");
            warnings.push(Warning::data_gap(
                "paper",
                missing,
                "citation endpoint absent; edge skipped",
            ));
        }

        let run = propagation::propagate(&index, params, &seeds, deadline);

        if run.timed_out {
            warn!(
                iterations = run.iterations,
                max_depth = params.max_depth,
                "Influence propagation hit the deadline"
            );
            warnings.push(Warning::timeout("influence", run.iterations, params.max_depth));
        } else if !run.converged {
            debug!(
                iterations = run.iterations,
                residual = run.max_delta,
                "Influence propagation did not converge"
            );
            warnings.push(Warning::convergence("influence", run.iterations, run.max_delta));
        }

        let total_edges = index.edge_count();
        let norm = if total_edges > 0 { total_edges as f64 } else { 1.0 };

        let mut ranked: Vec<(InfluenceScore, Option<chrono::NaiveDate>)> = (0..index.node_count())
            .filter(|&p| seeds[p] || run.scores[p] > 0.0)
            .map(|p| {
                let score = InfluenceScore {
                    paper_id: index.id(p),
                    score: run.scores[p] / norm,
                    raw_score: run.scores[p],
                    direct_citations: if seeds[p] { run.initial[p] as usize } else { 0 },
                    depth_reached: run.depth_reached[p],
                    converged: run.converged,
                };
                (score, index.published_on(p))
            })
            .collect();

        // Score descending, earlier publication first, then id ascending
        ranked.sort_by(|(a, a_date), (b, b_date)| {
            b.raw_score
                .partial_cmp(&a.raw_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| match (a_date, b_date) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
                .then_with(|| a.paper_id.cmp(&b.paper_id))
        });

        debug!(
            papers = ranked.len(),
            iterations = run.iterations,
            converged = run.converged,
            "Influence ranking computed"
        );

        Ok(Outcome::with_warnings(
            InfluenceRanking {
                scores: ranked.into_iter().map(|(score, _)| score).collect(),
                iterations: run.iterations,
                converged: run.converged,
                total_edges,
                mode: params.mode,
            },
            warnings,
        ))
    }

    fn resolve_seeds(&self, index: &CitationIndex, seeds: Option<&[PaperId]>) -> Result<Vec<bool>> {
        let Some(seeds) = seeds else {
            return Ok(vec![true; index.node_count()]);
        };

        let mut mask = vec![false; index.node_count()];
        for seed in seeds {
            let position = index.index_of(*seed).ok_or_else(|| {
                AppError::integrity("paper", seed, "seed paper is not in the snapshot")
            })?;
            mask[position] = true;
        }
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Status;
    use chrono::NaiveDate;
    use litgraph_common::graph::{CitationType, GraphSnapshot, Paper, SnapshotBuilder};
    use uuid::Uuid;

    const A: u128 = 1;
    const B: u128 = 2;
    const C: u128 = 3;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// B -> A, C -> A, C -> B
    fn triangle() -> GraphSnapshot {
        let mut builder = SnapshotBuilder::new("v1");
        builder
            .add_paper(Paper::new(id(A), "A"))
            .add_paper(Paper::new(id(B), "B"))
            .add_paper(Paper::new(id(C), "C"));
        builder
            .add_citation(id(B), id(A), CitationType::Direct)
            .add_citation(id(C), id(A), CitationType::Direct)
            .add_citation(id(C), id(B), CitationType::Direct);
        builder.build()
    }

    fn params(decay: f64, max_depth: usize) -> InfluenceParams {
        InfluenceParams {
            decay,
            max_depth,
            ..Default::default()
        }
    }

    fn find(ranking: &InfluenceRanking, n: u128) -> &InfluenceScore {
        ranking.scores.iter().find(|s| s.paper_id == id(n)).unwrap()
    }

    #[test]
    fn test_triangle_scenario() {
        let snapshot = triangle();
        let engine = InfluenceEngine::new(&snapshot);

        let one = engine.compute(&params(0.5, 1), &Deadline::none()).unwrap().data;
        let a = find(&one, A);
        assert_eq!(a.direct_citations, 2);
        // depth 1 adds 0.5 * (B's 1 / 1 reference + C's 0 / 2 references)
        assert!((a.raw_score - 2.5).abs() < 1e-12);

        let outcome = engine.compute(&params(0.5, 2), &Deadline::none()).unwrap();
        let two = &outcome.data;
        let a = find(two, A);
        assert!((a.raw_score - 3.0).abs() < 1e-12);
        assert!((a.score - 1.0).abs() < 1e-12);
        assert_eq!(a.depth_reached, 2);
        assert_eq!(find(two, B).depth_reached, 0);
        assert_eq!(two.total_edges, 3);

        let order: Vec<_> = two.scores.iter().map(|s| s.paper_id).collect();
        assert_eq!(order, vec![id(A), id(B), id(C)]);

        // Cumulative propagation is still moving at depth 2
        assert!(!two.converged);
        assert_eq!(outcome.status(), Status::Partial);
    }

    #[test]
    fn test_frontier_mode_converges_on_dag() {
        let snapshot = triangle();
        let mut p = params(0.5, 10);
        p.mode = PropagationMode::Frontier;

        let outcome = InfluenceEngine::new(&snapshot).compute(&p, &Deadline::none()).unwrap();
        assert!(outcome.data.converged);
        assert_eq!(outcome.status(), Status::Ok);
        assert!((find(&outcome.data, A).raw_score - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_seeds_and_ties() {
        let snapshot = triangle();
        let mut p = params(0.5, 2);
        p.seeds = Some(vec![id(B)]);

        let ranking = InfluenceEngine::new(&snapshot).compute(&p, &Deadline::none()).unwrap().data;
        // A gets 0.5 from B at each of two iterations, tying B's own 1.0
        let ids: Vec<_> = ranking.scores.iter().map(|s| s.paper_id).collect();
        assert_eq!(ids, vec![id(A), id(B)]);
        assert_eq!(find(&ranking, A).direct_citations, 0);
        assert!((find(&ranking, A).raw_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_prefer_earlier_publication() {
        let mut builder = SnapshotBuilder::new("v1");
        builder
            .add_paper(Paper::new(id(1), "undated"))
            .add_paper(Paper::new(id(2), "late").published(date(2022, 1, 1)))
            .add_paper(Paper::new(id(3), "early").published(date(2019, 1, 1)));
        let snapshot = builder.build();

        let ranking = InfluenceEngine::new(&snapshot)
            .compute(&params(0.5, 1), &Deadline::none())
            .unwrap()
            .data;
        let ids: Vec<_> = ranking.scores.iter().map(|s| s.paper_id).collect();
        assert_eq!(ids, vec![id(3), id(2), id(1)]);
    }

    #[test]
    fn test_unknown_seed_is_integrity_error() {
        let snapshot = triangle();
        let mut p = params(0.5, 2);
        p.seeds = Some(vec![id(99)]);

        let err = InfluenceEngine::new(&snapshot).compute(&p, &Deadline::none()).unwrap_err();
        assert!(err.is_integrity_error());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let snapshot = triangle();
        let engine = InfluenceEngine::new(&snapshot);
        assert!(engine.compute(&params(0.0, 2), &Deadline::none()).is_err());
        assert!(engine.compute(&params(1.01, 2), &Deadline::none()).is_err());
        assert!(engine.compute(&params(0.5, 0), &Deadline::none()).is_err());
        assert!(engine.compute(&params(1.0, 1), &Deadline::none()).is_ok());
    }

    #[test]
    fn test_dangling_citation_is_a_gap() {
        let mut builder = SnapshotBuilder::new("v1");
        builder.add_paper(Paper::new(id(1), "A")).add_paper(Paper::new(id(2), "B"));
        builder
            .add_citation(id(2), id(1), CitationType::Direct)
            .add_citation(id(2), id(42), CitationType::Direct);
        let snapshot = builder.build();

        let outcome = InfluenceEngine::new(&snapshot)
            .compute(&params(0.5, 3), &Deadline::none())
            .unwrap();
        assert_eq!(outcome.data_gaps(), 1);
        assert_eq!(outcome.data.total_edges, 1);
        // B's single resolved reference carries all of its weight
        assert_eq!(find(&outcome.data, 1).direct_citations, 1);
    }

    #[test]
    fn test_cancelled_deadline_returns_partial_ranking() {
        let snapshot = triangle();
        let deadline = Deadline::none();
        deadline.cancel();

        let outcome = InfluenceEngine::new(&snapshot).compute(&params(0.5, 4), &deadline).unwrap();
        assert_eq!(outcome.status(), Status::Partial);
        assert!(matches!(outcome.warnings[0], Warning::Timeout { .. }));
        assert_eq!(outcome.data.iterations, 0);
        assert!((find(&outcome.data, A).raw_score - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_idempotent() {
        let snapshot = litgraph_common::graph::synthetic::SyntheticGraph::generate_with_seed(7);
        let engine = InfluenceEngine::new(&snapshot);
        let first = engine.compute(&params(0.5, 4), &Deadline::none()).unwrap();
        let second = engine.compute(&params(0.5, 4), &Deadline::none()).unwrap();
        assert_eq!(first, second);
    }
}
