//! Bounded damped influence propagation
//!
//! Iteration 0 gives every seed paper its direct citation count. Each later
//! iteration pushes influence from citing papers to the papers they cite,
//! split evenly over the citing paper's references and damped by `decay`.
//! The loop stops after `max_depth` iterations or once the largest
//! per-paper change drops below `epsilon`, so cycles cannot keep it running.

use super::graph::CitationIndex;
use crate::deadline::Deadline;
use litgraph_common::errors::{AppError, Result};
use litgraph_common::graph::{CitationType, PaperId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// What each iteration propagates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMode {
    /// Propagate the full running score of every citing paper
    #[default]
    Cumulative,

    /// Propagate only what the previous iteration added (sum over citation
    /// paths of bounded length); reaches a fixed point on acyclic graphs
    Frontier,
}

/// Propagation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct InfluenceParams {
    /// Per-hop decay factor
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub decay: f64,

    /// Maximum propagation depth
    #[validate(range(min = 1))]
    pub max_depth: usize,

    /// Convergence threshold
    #[validate(range(min = 0.0))]
    pub epsilon: f64,

    /// Papers receiving initial mass; every paper when `None`
    #[serde(default)]
    pub seeds: Option<Vec<PaperId>>,

    /// Edge weight per citation type; missing types weigh 1.0
    #[serde(default)]
    pub type_weights: BTreeMap<CitationType, f64>,

    #[serde(default)]
    pub mode: PropagationMode,
}

impl Default for InfluenceParams {
    fn default() -> Self {
        Self {
            decay: 0.5,
            max_depth: 5,
            epsilon: 1e-6,
            seeds: None,
            type_weights: BTreeMap::new(),
            mode: PropagationMode::Cumulative,
        }
    }
}

impl InfluenceParams {
    /// Reject parameters outside their domain before any work starts
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if !self.decay.is_finite() {
            return Err(AppError::invalid_parameter("decay", "must be a finite number in (0, 1]"));
        }
        if !self.epsilon.is_finite() {
            return Err(AppError::invalid_parameter(
                "epsilon",
                "must be a finite non-negative number",
            ));
        }
        for (citation_type, weight) in &self.type_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(AppError::invalid_parameter(
                    "type_weights",
                    format!(
                        "weight for `{}` must be finite and non-negative",
                        citation_type.as_str()
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn weight(&self, citation_type: CitationType) -> f64 {
        self.type_weights.get(&citation_type).copied().unwrap_or(1.0)
    }
}

/// Raw per-position propagation state
#[derive(Debug, Clone)]
pub(crate) struct Propagation {
    pub initial: Vec<f64>,
    pub scores: Vec<f64>,
    pub depth_reached: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
    pub timed_out: bool,
    /// Largest per-paper change in the last completed iteration
    pub max_delta: f64,
}

/// Run the bounded fixed-point iteration
pub(crate) fn propagate(
    index: &CitationIndex,
    params: &InfluenceParams,
    seeds: &[bool],
    deadline: &Deadline,
) -> Propagation {
    let n = index.node_count();

    let initial: Vec<f64> = (0..n)
        .map(|p| if seeds[p] { index.citation_count(p) as f64 } else { 0.0 })
        .collect();
    let mut scores = initial.clone();
    let mut frontier = initial.clone();
    let mut depth_reached = vec![0usize; n];

    let mut iterations = 0;
    let mut converged = false;
    let mut timed_out = false;
    let mut max_delta = 0.0f64;

    for depth in 1..=params.max_depth {
        if deadline.is_expired() {
            timed_out = true;
            break;
        }

        let source = match params.mode {
            PropagationMode::Cumulative => &scores,
            PropagationMode::Frontier => &frontier,
        };

        // Every paper reads only the previous iteration's state
        let deltas: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|p| {
                let inflow: f64 = index
                    .citations(p)
                    .iter()
                    .map(|&(citing, weight)| {
                        weight * source[citing] / index.reference_count(citing) as f64
                    })
                    .sum();
                params.decay * inflow
            })
            .collect();

        max_delta = deltas.iter().copied().fold(0.0, f64::max);
        for (p, delta) in deltas.iter().enumerate() {
            if *delta > 0.0 {
                scores[p] += delta;
                depth_reached[p] = depth;
            }
        }
        frontier = deltas;
        iterations = depth;

        if max_delta < params.epsilon || max_delta == 0.0 {
            converged = true;
            break;
        }
    }

    Propagation {
        initial,
        scores,
        depth_reached,
        iterations,
        converged,
        timed_out,
        max_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litgraph_common::graph::{Paper, SnapshotBuilder};
    use uuid::Uuid;

    fn chain(len: u128) -> CitationIndex {
        // 1 <- 2 <- 3 <- ... (each paper cites its predecessor)
        let mut builder = SnapshotBuilder::new("v1");
        for n in 1..=len {
            builder.add_paper(Paper::new(Uuid::from_u128(n), format!("P{}", n)));
        }
        for n in 2..=len {
            builder.add_citation(Uuid::from_u128(n), Uuid::from_u128(n - 1), CitationType::Direct);
        }
        CitationIndex::build(&builder.build(), |_| 1.0)
    }

    #[test]
    fn test_params_validation() {
        assert!(InfluenceParams::default().check().is_ok());

        for decay in [0.0, -0.1, 1.5, f64::NAN] {
            let params = InfluenceParams { decay, ..Default::default() };
            assert!(params.check().unwrap_err().is_caller_error(), "decay {} accepted", decay);
        }

        let params = InfluenceParams { max_depth: 0, ..Default::default() };
        assert!(params.check().is_err());

        let mut params = InfluenceParams::default();
        params.type_weights.insert(CitationType::Background, -1.0);
        assert!(params.check().is_err());
    }

    #[test]
    fn test_frontier_reaches_fixed_point_on_chain() {
        let index = chain(4);
        let params = InfluenceParams {
            mode: PropagationMode::Frontier,
            max_depth: 10,
            ..Default::default()
        };
        let run = propagate(&index, &params, &[true; 4], &Deadline::none());

        assert!(run.converged);
        assert!(run.iterations < 10);
        // Paper 1: 1 direct citer, then 0.5 * 1 from paper 2, then 0.25 * 1 from paper 3
        assert!((run.scores[0] - 1.75).abs() < 1e-12);
        assert_eq!(run.depth_reached[0], 2);
        assert_eq!(run.depth_reached[3], 0);
    }

    #[test]
    fn test_cumulative_on_cycle_stops_at_depth() {
        let mut builder = SnapshotBuilder::new("v1");
        builder
            .add_paper(Paper::new(Uuid::from_u128(1), "A"))
            .add_paper(Paper::new(Uuid::from_u128(2), "B"));
        builder
            .add_citation(Uuid::from_u128(1), Uuid::from_u128(2), CitationType::Direct)
            .add_citation(Uuid::from_u128(2), Uuid::from_u128(1), CitationType::Direct);
        let index = CitationIndex::build(&builder.build(), |_| 1.0);

        let params = InfluenceParams { max_depth: 7, ..Default::default() };
        let run = propagate(&index, &params, &[true, true], &Deadline::none());

        assert_eq!(run.iterations, 7);
        assert!(!run.converged);
        assert!(run.scores.iter().all(|s| *s > 1.0));
    }

    #[test]
    fn test_expired_deadline_keeps_initial_scores() {
        let index = chain(3);
        let deadline = Deadline::none();
        deadline.cancel();
        let run = propagate(&index, &InfluenceParams::default(), &[true; 3], &deadline);

        assert!(run.timed_out);
        assert_eq!(run.iterations, 0);
        assert_eq!(run.scores, run.initial);
    }
}
