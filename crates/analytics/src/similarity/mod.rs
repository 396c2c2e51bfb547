//! Multi-factor paper similarity
//!
//! Candidates come from the inverted keyword index. Each candidate is scored
//! on title, abstract, publication-date, citation and author components and
//! ranked by the weighted composite.

mod components;
mod index;

pub use components::{
    jaccard, overlap_coefficient, temporal_decay, ComponentScores, SimilarityWeights,
};
pub use index::{Candidate, KeywordIndex};

use crate::deadline::Deadline;
use crate::outcome::{Outcome, Warning};
use chrono::NaiveDate;
use litgraph_common::errors::{AppError, Result};
use litgraph_common::graph::{AuthorId, GraphStore, Paper, PaperId};
use litgraph_common::keywords::KeywordExtractor;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use validator::Validate;

/// Candidates scored per deadline check
const CANDIDATE_CHUNK: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimilarityParams {
    #[validate(range(min = 1))]
    pub top_k: usize,

    #[validate(range(min = 1))]
    pub candidate_limit: usize,

    /// Temporal decay constant in days
    #[validate(range(exclusive_min = 0.0))]
    pub temporal_tau_days: f64,

    pub weights: SimilarityWeights,
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self {
            top_k: 20,
            candidate_limit: 500,
            temporal_tau_days: 730.0,
            weights: SimilarityWeights::default(),
        }
    }
}

impl SimilarityParams {
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if !self.temporal_tau_days.is_finite() {
            return Err(AppError::invalid_parameter("temporal_tau_days", "must be finite"));
        }
        self.weights.check()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub target_id: PaperId,
    pub candidate_id: PaperId,
    pub shared_keywords: usize,
    pub components: ComponentScores,
    /// Weighted composite in [0, 1]
    pub composite: f64,
}

/// Author-side feature: who wrote it and where they work
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum AuthorFeature {
    Author(AuthorId),
    Affiliation(String),
}

/// Everything the components need from one paper
struct PaperFeatures {
    title: BTreeSet<String>,
    abstract_tokens: BTreeSet<String>,
    published_on: Option<NaiveDate>,
    cited: BTreeSet<PaperId>,
    authors: BTreeSet<AuthorFeature>,
}

/// Similarity engine over one snapshot and its keyword index
pub struct SimilarityEngine<'a> {
    store: &'a dyn GraphStore,
    index: &'a KeywordIndex,
    extractor: &'a dyn KeywordExtractor,
}

impl<'a> SimilarityEngine<'a> {
    pub fn new(
        store: &'a dyn GraphStore,
        index: &'a KeywordIndex,
        extractor: &'a dyn KeywordExtractor,
    ) -> Self {
        Self {
            store,
            index,
            extractor,
        }
    }

    /// Top-K papers most similar to `target`
    pub fn find_similar(
        &self,
        target: PaperId,
        params: &SimilarityParams,
        deadline: &Deadline,
    ) -> Result<Outcome<Vec<SimilarityResult>>> {
        params.check()?;
        let target_paper = self.store.paper(target)?;

        let mut warnings = Vec::new();
        let target_features = self.features(target_paper, &mut warnings);
        let candidates = self.index.candidates(target, params.candidate_limit);

        let mut results = Vec::with_capacity(candidates.len());
        let mut scored = 0;
        for chunk in candidates.chunks(CANDIDATE_CHUNK) {
            if deadline.is_expired() {
                warn!(scored, total = candidates.len(), "Similarity scoring hit the deadline");
                warnings.push(Warning::timeout("similarity", scored, candidates.len()));
                break;
            }

            let chunk_results: Vec<(Option<SimilarityResult>, Vec<Warning>)> = chunk
                .par_iter()
                .map(|candidate| {
                    let mut gaps = Vec::new();
                    let result = self.score(target, &target_features, candidate, params, &mut gaps);
                    (result, gaps)
                })
                .collect();

            for (result, gaps) in chunk_results {
                results.extend(result);
                warnings.extend(gaps);
            }
            scored += chunk.len();
        }

        results.sort_by(|a, b| {
            b.composite
                .partial_cmp(&a.composite)
                .unwrap_or(Ordering::Equal)
                .then(a.candidate_id.cmp(&b.candidate_id))
        });
        results.truncate(params.top_k);

        debug!(
            target = %target,
            candidates = candidates.len(),
            returned = results.len(),
            "Similarity computed"
        );
        Ok(Outcome::with_warnings(results, warnings))
    }

    fn score(
        &self,
        target: PaperId,
        target_features: &PaperFeatures,
        candidate: &Candidate,
        params: &SimilarityParams,
        gaps: &mut Vec<Warning>,
    ) -> Option<SimilarityResult> {
        let paper = match self.store.paper(candidate.paper_id) {
            Ok(paper) => paper,
            Err(_) => {
                gaps.push(Warning::data_gap(
                    "paper",
                    candidate.paper_id,
                    "indexed candidate absent; skipped",
                ));
                return None;
            }
        };
        let features = self.features(paper, gaps);
        let components = compare(target_features, &features, params.temporal_tau_days);

        Some(SimilarityResult {
            target_id: target,
            candidate_id: candidate.paper_id,
            shared_keywords: candidate.shared_keywords,
            composite: components.composite(&params.weights),
            components,
        })
    }

    fn features(&self, paper: &Paper, gaps: &mut Vec<Warning>) -> PaperFeatures {
        let cited = self
            .store
            .cited_by(paper.id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        let mut authors = BTreeSet::new();
        for authorship in self.store.authors_of(paper.id).unwrap_or_default() {
            authors.insert(AuthorFeature::Author(authorship.author_id));
            match self.store.author(authorship.author_id) {
                Ok(author) => {
                    let affiliation = author.affiliation.as_deref().map(str::trim);
                    if let Some(affiliation) = affiliation.filter(|a| !a.is_empty()) {
                        authors.insert(AuthorFeature::Affiliation(affiliation.to_lowercase()));
                    }
                }
                Err(_) => {
                    warn!(
                        paper_id = %paper.id,
                        author_id = %authorship.author_id,
                        "Author absent from snapshot"
                    );
                    gaps.push(Warning::data_gap(
                        "author",
                        authorship.author_id,
                        "author absent; affiliation unknown",
                    ));
                }
            }
        }

        PaperFeatures {
            title: self.extractor.extract(&paper.title),
            abstract_tokens: self.extractor.extract(&paper.abstract_text),
            published_on: paper.published_on,
            cited,
            authors,
        }
    }
}

/// Component scores; a component needs data on both sides
fn compare(a: &PaperFeatures, b: &PaperFeatures, tau_days: f64) -> ComponentScores {
    fn both<T: Ord>(
        a: &BTreeSet<T>,
        b: &BTreeSet<T>,
        f: fn(&BTreeSet<T>, &BTreeSet<T>) -> f64,
    ) -> Option<f64> {
        (!a.is_empty() && !b.is_empty()).then(|| f(a, b))
    }

    ComponentScores {
        title: both(&a.title, &b.title, jaccard),
        abstract_text: both(&a.abstract_tokens, &b.abstract_tokens, overlap_coefficient),
        temporal: match (a.published_on, b.published_on) {
            (Some(x), Some(y)) => Some(temporal_decay((x - y).num_days(), tau_days)),
            _ => None,
        },
        citation: both(&a.cited, &b.cited, jaccard),
        author: both(&a.authors, &b.authors, jaccard),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Status;
    use litgraph_common::graph::{Author, CitationType, GraphSnapshot, SnapshotBuilder};
    use litgraph_common::keywords::StopwordExtractor;
    use uuid::Uuid;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn corpus() -> GraphSnapshot {
        let mut builder = SnapshotBuilder::new("v1");
        builder
            .add_paper(
                Paper::new(id(1), "Lithium anode cycling")
                    .with_abstract("Silicon anodes degrade during fast charging.")
                    .published(date(2022, 1, 1))
                    .with_keywords(["anode", "cycling"]),
            )
            .add_paper(
                Paper::new(id(2), "Lithium cathode cycling")
                    .with_abstract("Cathode degradation during fast charging.")
                    .published(date(2022, 1, 1))
                    .with_keywords(["cathode", "cycling"]),
            )
            .add_paper(
                Paper::new(id(3), "Sodium anode interphase")
                    .published(date(2012, 1, 1))
                    .with_keywords(["anode"]),
            )
            .add_paper(Paper::new(id(4), "Unrelated separator").with_keywords(["separator"]))
            .add_paper(Paper::new(id(10), "Shared reference"));
        builder
            .add_citation(id(1), id(10), CitationType::Direct)
            .add_citation(id(2), id(10), CitationType::Background);
        builder
            .add_author(Author::new(id(50), "Ana Chen").with_affiliation("MIT"))
            .add_author(Author::new(id(51), "Wei Kim").with_affiliation("MIT"));
        builder.add_authorship(id(1), id(50), 0).unwrap();
        builder.add_authorship(id(2), id(51), 0).unwrap();
        builder.build()
    }

    fn run(snapshot: &GraphSnapshot, params: &SimilarityParams) -> Outcome<Vec<SimilarityResult>> {
        let extractor = StopwordExtractor::default();
        let index = KeywordIndex::build(snapshot, &extractor);
        SimilarityEngine::new(snapshot, &index, &extractor)
            .find_similar(id(1), params, &Deadline::none())
            .unwrap()
    }

    #[test]
    fn test_components_and_ranking() {
        let snapshot = corpus();
        let results = run(&snapshot, &SimilarityParams::default()).data;

        // Paper 4 shares no keyword and never becomes a candidate
        let ids: Vec<_> = results.iter().map(|r| r.candidate_id).collect();
        assert_eq!(ids, vec![id(2), id(3)]);

        let best = &results[0].components;
        assert_eq!(best.title, Some(0.5));
        assert_eq!(best.temporal, Some(1.0));
        assert_eq!(best.citation, Some(1.0));
        // {author 50, mit} vs {author 51, mit}
        assert!((best.author.unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!(best.abstract_text.unwrap() > 0.0);

        let weak = &results[1].components;
        assert_eq!(weak.abstract_text, None);
        assert_eq!(weak.citation, None);
        assert_eq!(weak.author, None);
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.composite)));
    }

    #[test]
    fn test_top_k_and_pool_limit() {
        let snapshot = corpus();
        let params = SimilarityParams {
            top_k: 1,
            ..Default::default()
        };
        assert_eq!(run(&snapshot, &params).data.len(), 1);

        // The pool keeps the lowest id among equally-shared candidates
        let params = SimilarityParams {
            candidate_limit: 1,
            ..Default::default()
        };
        let results = run(&snapshot, &params).data;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].candidate_id, id(2));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let snapshot = corpus();
        let extractor = StopwordExtractor::default();
        let index = KeywordIndex::build(&snapshot, &extractor);
        let engine = SimilarityEngine::new(&snapshot, &index, &extractor);

        let bad = [
            SimilarityParams { top_k: 0, ..Default::default() },
            SimilarityParams { candidate_limit: 0, ..Default::default() },
            SimilarityParams { temporal_tau_days: 0.0, ..Default::default() },
            SimilarityParams {
                weights: SimilarityWeights { title: -1.0, ..Default::default() },
                ..Default::default()
            },
        ];
        for params in bad {
            let err = engine.find_similar(id(1), &params, &Deadline::none()).unwrap_err();
            assert!(matches!(err, AppError::InvalidParameter { .. }));
        }

        let err = engine
            .find_similar(id(77), &SimilarityParams::default(), &Deadline::none())
            .unwrap_err();
        assert!(err.is_integrity_error());
    }

    #[test]
    fn test_missing_author_is_a_gap() {
        let mut builder = SnapshotBuilder::new("v1");
        builder
            .add_paper(Paper::new(id(1), "Anode study").with_keywords(["anode"]))
            .add_paper(Paper::new(id(2), "Anode review").with_keywords(["anode"]));
        builder.add_authorship(id(2), id(60), 0).unwrap();
        let snapshot = builder.build();

        let outcome = run(&snapshot, &SimilarityParams::default());
        assert_eq!(outcome.data.len(), 1);
        assert_eq!(outcome.data_gaps(), 1);
        assert_eq!(outcome.status(), Status::Ok);
    }

    #[test]
    fn test_deadline_returns_partial() {
        let snapshot = corpus();
        let extractor = StopwordExtractor::default();
        let index = KeywordIndex::build(&snapshot, &extractor);
        let deadline = Deadline::none();
        deadline.cancel();

        let outcome = SimilarityEngine::new(&snapshot, &index, &extractor)
            .find_similar(id(1), &SimilarityParams::default(), &deadline)
            .unwrap();
        assert_eq!(outcome.status(), Status::Partial);
        assert!(outcome.data.is_empty());
    }
}
