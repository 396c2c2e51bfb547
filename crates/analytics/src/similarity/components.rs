//! Similarity components and their weighted combination
//!
//! Every component lies in [0, 1]. A component is unavailable (`None`) when
//! either paper lacks the data it needs; the composite renormalizes the
//! weights over the available ones.

use litgraph_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// |A ∩ B| / |A ∪ B|; 0 for two empty sets
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// |A ∩ B| / min(|A|, |B|); 0 when either set is empty
pub fn overlap_coefficient<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        0.0
    } else {
        a.intersection(b).count() as f64 / smaller as f64
    }
}

/// exp(-|days| / tau)
pub fn temporal_decay(days_apart: i64, tau_days: f64) -> f64 {
    (-(days_apart.unsigned_abs() as f64) / tau_days).exp()
}

/// Component weights; need not sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub title: f64,
    pub abstract_text: f64,
    pub temporal: f64,
    pub citation: f64,
    pub author: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            title: 0.25,
            abstract_text: 0.25,
            temporal: 0.10,
            citation: 0.25,
            author: 0.15,
        }
    }
}

impl SimilarityWeights {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("title", self.title),
            ("abstract_text", self.abstract_text),
            ("temporal", self.temporal),
            ("citation", self.citation),
            ("author", self.author),
        ]
    }

    /// Weights must be finite, non-negative and not all zero
    pub fn check(&self) -> Result<()> {
        for (name, weight) in self.named() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::invalid_parameter(
                    format!("weights.{}", name),
                    "must be a finite non-negative number",
                ));
            }
        }
        if self.named().iter().all(|(_, w)| *w == 0.0) {
            return Err(AppError::invalid_parameter(
                "weights",
                "at least one weight must be positive",
            ));
        }
        Ok(())
    }
}

/// Per-component scores; `None` marks missing data
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub title: Option<f64>,
    pub abstract_text: Option<f64>,
    pub temporal: Option<f64>,
    pub citation: Option<f64>,
    pub author: Option<f64>,
}

impl ComponentScores {
    /// Weighted mean over available components; 0 when none carry weight
    pub fn composite(&self, weights: &SimilarityWeights) -> f64 {
        let pairs = [
            (self.title, weights.title),
            (self.abstract_text, weights.abstract_text),
            (self.temporal, weights.temporal),
            (self.citation, weights.citation),
            (self.author, weights.author),
        ];

        let (weighted, total) = pairs
            .iter()
            .filter_map(|(score, weight)| score.map(|s| (s, *weight)))
            .fold((0.0, 0.0), |(sum, norm), (s, w)| (sum + w * s, norm + w));

        if total > 0.0 {
            (weighted / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
