//! Inverted keyword index
//!
//! keyword -> papers carrying it. Candidate generation walks only the
//! postings of the target's keywords instead of scanning every pair.

use litgraph_common::graph::{GraphStore, PaperId};
use litgraph_common::keywords::KeywordExtractor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// A candidate and how many keywords it shares with the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub paper_id: PaperId,
    pub shared_keywords: usize,
}

pub struct KeywordIndex {
    snapshot_version: String,

    /// keyword -> paper ids, ascending
    postings: HashMap<String, Vec<PaperId>>,

    /// paper_id -> its keyword set
    keywords: HashMap<PaperId, BTreeSet<String>>,
}

impl KeywordIndex {
    /// Index every paper; papers without stored keywords go through `extractor`
    pub fn build(store: &dyn GraphStore, extractor: &dyn KeywordExtractor) -> Self {
        let mut postings: HashMap<String, Vec<PaperId>> = HashMap::new();
        let mut keywords = HashMap::new();

        for paper in store.papers() {
            let set = if paper.keywords.is_empty() {
                extractor.extract(&paper.text())
            } else {
                paper.keywords.clone()
            };
            for keyword in &set {
                postings.entry(keyword.clone()).or_default().push(paper.id);
            }
            keywords.insert(paper.id, set);
        }

        debug!(
            papers = keywords.len(),
            keywords = postings.len(),
            "Keyword index built"
        );

        Self {
            snapshot_version: store.snapshot_version().to_string(),
            postings,
            keywords,
        }
    }

    pub fn snapshot_version(&self) -> &str {
        &self.snapshot_version
    }

    pub fn keyword_count(&self) -> usize {
        self.postings.len()
    }

    pub fn keywords_of(&self, paper: PaperId) -> Option<&BTreeSet<String>> {
        self.keywords.get(&paper)
    }

    /// Papers sharing at least one keyword with `target`, most shared
    /// keywords first, then by id; at most `limit`
    pub fn candidates(&self, target: PaperId, limit: usize) -> Vec<Candidate> {
        let Some(target_keywords) = self.keywords.get(&target) else {
            return Vec::new();
        };

        let mut shared: HashMap<PaperId, usize> = HashMap::new();
        for keyword in target_keywords {
            for paper in self.postings.get(keyword).into_iter().flatten() {
                if *paper != target {
                    *shared.entry(*paper).or_default() += 1;
                }
            }
        }

        let mut candidates: Vec<Candidate> = shared
            .into_iter()
            .map(|(paper_id, shared_keywords)| Candidate {
                paper_id,
                shared_keywords,
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.shared_keywords
                .cmp(&a.shared_keywords)
                .then(a.paper_id.cmp(&b.paper_id))
        });
        candidates.truncate(limit);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litgraph_common::graph::{Paper, SnapshotBuilder};
    use litgraph_common::keywords::StopwordExtractor;
    use uuid::Uuid;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_candidates_ranked_by_shared_keywords() {
        let mut builder = SnapshotBuilder::new("v7");
        builder
            .add_paper(Paper::new(id(1), "target").with_keywords(["anode", "silicon", "cycling"]))
            .add_paper(Paper::new(id(2), "one").with_keywords(["anode"]))
            .add_paper(Paper::new(id(3), "two").with_keywords(["anode", "silicon"]))
            .add_paper(Paper::new(id(4), "other").with_keywords(["cathode"]))
            .add_paper(Paper::new(id(5), "Silicon cycling limits"));
        let snapshot = builder.build();

        let index = KeywordIndex::build(&snapshot, &StopwordExtractor::default());
        assert_eq!(index.snapshot_version(), "v7");

        let candidates = index.candidates(id(1), 10);
        let ids: Vec<_> = candidates.iter().map(|c| c.paper_id).collect();
        // Paper 5 shares "silicon" and "cycling" through extracted title keywords
        assert_eq!(ids, vec![id(3), id(5), id(2)]);
        assert_eq!(candidates[0].shared_keywords, 2);

        assert_eq!(index.candidates(id(1), 1).len(), 1);
        assert!(index.candidates(id(4), 10).is_empty());
        assert!(index.candidates(id(42), 10).is_empty());
    }
}
