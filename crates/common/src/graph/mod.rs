//! Literature graph snapshot
//!
//! Provides:
//! - Core entity types (papers, citations, authors, authorships)
//! - The read-only `GraphStore` contract every analytics engine consumes
//! - An immutable in-memory snapshot and its builder
//! - A registry that hands out the current snapshot atomically
//! - A seeded synthetic snapshot generator for tests and benches

mod registry;
mod snapshot;
pub mod synthetic;

pub use registry::SnapshotRegistry;
pub use snapshot::{GraphSnapshot, IntegrityReport, SnapshotBuilder};

use crate::errors::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Paper identifier
pub type PaperId = Uuid;

/// Author identifier
pub type AuthorId = Uuid;

/// A paper as seen by the analytics engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: PaperId,

    pub title: String,

    pub abstract_text: String,

    /// Publication date, when known
    pub published_on: Option<NaiveDate>,

    /// Citation count as recorded by the store (may include external citers)
    pub citation_count: u32,

    /// Normalized keyword set derived at ingestion time
    pub keywords: BTreeSet<String>,

    pub journal: Option<String>,

    pub doi: Option<String>,
}

impl Paper {
    /// Create a paper with only an id and title
    pub fn new(id: PaperId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            abstract_text: String::new(),
            published_on: None,
            citation_count: 0,
            keywords: BTreeSet::new(),
            journal: None,
            doi: None,
        }
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = text.into();
        self
    }

    pub fn published(mut self, date: NaiveDate) -> Self {
        self.published_on = Some(date);
        self
    }

    pub fn with_citation_count(mut self, count: u32) -> Self {
        self.citation_count = count;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Title and abstract joined, as fed to keyword extraction
    pub fn text(&self) -> String {
        if self.abstract_text.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.abstract_text)
        }
    }
}

/// Citation relationship type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationType {
    Direct,
    Comparative,
    Methodological,
    Background,
}

impl CitationType {
    pub const ALL: [CitationType; 4] = [
        CitationType::Direct,
        CitationType::Comparative,
        CitationType::Methodological,
        CitationType::Background,
    ];

    /// Parse a stored type string; unknown values are treated as direct
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "comparative" => CitationType::Comparative,
            "methodological" => CitationType::Methodological,
            "background" => CitationType::Background,
            _ => CitationType::Direct,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CitationType::Direct => "direct",
            CitationType::Comparative => "comparative",
            CitationType::Methodological => "methodological",
            CitationType::Background => "background",
        }
    }
}

/// Directed citation edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationEdge {
    /// Citing paper ID
    pub citing_id: PaperId,

    /// Cited paper ID
    pub cited_id: PaperId,

    pub citation_type: CitationType,
}

/// An author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,

    pub name: String,

    pub h_index: u32,

    pub affiliation: Option<String>,
}

impl Author {
    pub fn new(id: AuthorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            h_index: 0,
            affiliation: None,
        }
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn with_h_index(mut self, h_index: u32) -> Self {
        self.h_index = h_index;
        self
    }
}

/// Paper-author edge; `position` is unique per paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorship {
    pub paper_id: PaperId,

    pub author_id: AuthorId,

    pub position: u32,
}

/// Read-only access to one consistent snapshot of the literature graph.
///
/// Lookups of ids absent from the snapshot fail with an integrity error.
/// Adjacency lists may still mention ids that are absent (dangling edges);
/// callers resolve those through `paper`/`author` and treat failures as gaps.
pub trait GraphStore: Send + Sync {
    /// Version identifying this snapshot
    fn snapshot_version(&self) -> &str;

    /// Look up a paper
    fn paper(&self, id: PaperId) -> Result<&Paper>;

    /// Look up an author
    fn author(&self, id: AuthorId) -> Result<&Author>;

    /// Papers citing `id`
    fn citers_of(&self, id: PaperId) -> Result<&[PaperId]>;

    /// Papers cited by `id`
    fn cited_by(&self, id: PaperId) -> Result<&[PaperId]>;

    /// Authorships of a paper, ordered by position
    fn authors_of(&self, id: PaperId) -> Result<&[Authorship]>;

    /// Distinct co-authors of an author across all of their papers
    fn co_authors_of(&self, id: AuthorId) -> Result<BTreeSet<AuthorId>>;

    /// Papers published on or after `date`, ordered by (date, id)
    fn papers_published_on_or_after(&self, date: NaiveDate) -> Vec<&Paper>;

    /// All papers ordered by id
    fn papers(&self) -> Vec<&Paper>;

    /// All authors ordered by id
    fn authors(&self) -> Vec<&Author>;

    /// All citation edges, in insertion order
    fn citations(&self) -> &[CitationEdge];

    /// Type of the citation `citing -> cited`, if the edge exists
    fn citation_type(&self, citing: PaperId, cited: PaperId) -> Option<CitationType>;
}

/// Somewhere a fresh snapshot can be loaded from
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Load a complete, consistent snapshot
    async fn load_snapshot(&self) -> Result<GraphSnapshot>;
}
