//! Immutable in-memory snapshot
//!
//! Built once through `SnapshotBuilder`, then shared read-only (`Arc`) by
//! every analysis running against it.

use super::{Author, AuthorId, Authorship, CitationEdge, CitationType, GraphStore, Paper, PaperId};
use crate::errors::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

/// In-memory literature graph
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    version: String,

    /// Papers keyed by id
    papers: BTreeMap<PaperId, Paper>,

    /// Authors keyed by id
    authors: BTreeMap<AuthorId, Author>,

    /// Every citation edge
    citations: Vec<CitationEdge>,

    /// Adjacency list: paper_id -> papers it cites
    outgoing: HashMap<PaperId, Vec<PaperId>>,

    /// Reverse adjacency: paper_id -> papers citing it
    incoming: HashMap<PaperId, Vec<PaperId>>,

    /// Edge type per ordered pair
    edge_types: HashMap<(PaperId, PaperId), CitationType>,

    /// paper_id -> authorships ordered by position
    authorships: HashMap<PaperId, Vec<Authorship>>,

    /// author_id -> papers they wrote
    papers_by_author: HashMap<AuthorId, Vec<PaperId>>,

    dropped_self_citations: usize,

    collapsed_duplicates: usize,
}

/// Counts of structural problems found in a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub papers: usize,
    pub authors: usize,
    pub citations: usize,

    /// Citation edges with at least one endpoint absent from the snapshot
    pub dangling_citations: usize,

    /// Authorships referencing an absent paper or author
    pub dangling_authorships: usize,

    pub papers_without_authors: usize,

    /// Self-citations dropped while building
    pub dropped_self_citations: usize,

    /// Repeated ordered citation pairs collapsed while building
    pub collapsed_duplicates: usize,
}

impl IntegrityReport {
    /// True when no reference points outside the snapshot
    pub fn is_consistent(&self) -> bool {
        self.dangling_citations == 0 && self.dangling_authorships == 0
    }
}

/// Builder enforcing the edge invariants
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    version: String,
    papers: BTreeMap<PaperId, Paper>,
    authors: BTreeMap<AuthorId, Author>,
    citations: Vec<CitationEdge>,
    edge_types: HashMap<(PaperId, PaperId), CitationType>,
    authorships: HashMap<PaperId, Vec<Authorship>>,
    dropped_self_citations: usize,
    collapsed_duplicates: usize,
}

impl SnapshotBuilder {
    /// Start a snapshot with the given version
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Add a paper; a later paper with the same id replaces the earlier one
    pub fn add_paper(&mut self, paper: Paper) -> &mut Self {
        if self.papers.insert(paper.id, paper).is_some() {
            debug!("Replaced duplicate paper while building snapshot");
        }
        self
    }

    /// Add an author; a later author with the same id replaces the earlier one
    pub fn add_author(&mut self, author: Author) -> &mut Self {
        self.authors.insert(author.id, author);
        self
    }

    /// Add a citation edge.
    ///
    /// Self-citations are dropped and a repeated ordered pair keeps its first type.
    pub fn add_citation(
        &mut self,
        citing: PaperId,
        cited: PaperId,
        citation_type: CitationType,
    ) -> &mut Self {
        if citing == cited {
            self.dropped_self_citations += 1;
            return self;
        }
        if self.edge_types.contains_key(&(citing, cited)) {
            self.collapsed_duplicates += 1;
            return self;
        }
        self.edge_types.insert((citing, cited), citation_type);
        self.citations.push(CitationEdge {
            citing_id: citing,
            cited_id: cited,
            citation_type,
        });
        self
    }

    /// Add an authorship edge; two different authors at one position is an integrity error
    pub fn add_authorship(
        &mut self,
        paper: PaperId,
        author: AuthorId,
        position: u32,
    ) -> Result<&mut Self> {
        let entries = self.authorships.entry(paper).or_default();

        if let Some(existing) = entries.iter().find(|a| a.position == position) {
            if existing.author_id == author {
                return Ok(self);
            }
            return Err(AppError::integrity(
                "paper",
                paper,
                format!(
                    "author position {} assigned to both {} and {}",
                    position, existing.author_id, author
                ),
            ));
        }
        if entries.iter().any(|a| a.author_id == author) {
            return Ok(self);
        }

        entries.push(Authorship {
            paper_id: paper,
            author_id: author,
            position,
        });
        Ok(self)
    }

    /// Freeze the snapshot and build its indexes
    pub fn build(self) -> GraphSnapshot {
        let mut outgoing: HashMap<PaperId, Vec<PaperId>> = HashMap::new();
        let mut incoming: HashMap<PaperId, Vec<PaperId>> = HashMap::new();
        for edge in &self.citations {
            outgoing.entry(edge.citing_id).or_default().push(edge.cited_id);
            incoming.entry(edge.cited_id).or_default().push(edge.citing_id);
        }

        let mut authorships = self.authorships;
        let mut papers_by_author: HashMap<AuthorId, Vec<PaperId>> = HashMap::new();
        for (paper_id, entries) in authorships.iter_mut() {
            entries.sort_by_key(|a| a.position);
            for entry in entries.iter() {
                papers_by_author.entry(entry.author_id).or_default().push(*paper_id);
            }
        }
        for papers in papers_by_author.values_mut() {
            papers.sort();
        }

        GraphSnapshot {
            version: self.version,
            papers: self.papers,
            authors: self.authors,
            citations: self.citations,
            outgoing,
            incoming,
            edge_types: self.edge_types,
            authorships,
            papers_by_author,
            dropped_self_citations: self.dropped_self_citations,
            collapsed_duplicates: self.collapsed_duplicates,
        }
    }
}

impl GraphSnapshot {
    /// Empty snapshot
    pub fn empty(version: impl Into<String>) -> Self {
        SnapshotBuilder::new(version).build()
    }

    pub fn paper_count(&self) -> usize {
        self.papers.len()
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn citation_count(&self) -> usize {
        self.citations.len()
    }

    pub fn contains_paper(&self, id: PaperId) -> bool {
        self.papers.contains_key(&id)
    }

    /// Papers written by an author, ordered by id
    pub fn papers_of(&self, author: AuthorId) -> &[PaperId] {
        self.papers_by_author.get(&author).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Count structural problems
    pub fn validate(&self) -> IntegrityReport {
        let dangling_citations = self
            .citations
            .iter()
            .filter(|e| {
                !self.papers.contains_key(&e.citing_id) || !self.papers.contains_key(&e.cited_id)
            })
            .count();

        let dangling_authorships = self
            .authorships
            .values()
            .flatten()
            .filter(|a| {
                !self.papers.contains_key(&a.paper_id) || !self.authors.contains_key(&a.author_id)
            })
            .count();

        let papers_without_authors = self
            .papers
            .keys()
            .filter(|id| self.authorships.get(id).map_or(true, |v| v.is_empty()))
            .count();

        IntegrityReport {
            papers: self.papers.len(),
            authors: self.authors.len(),
            citations: self.citations.len(),
            dangling_citations,
            dangling_authorships,
            papers_without_authors,
            dropped_self_citations: self.dropped_self_citations,
            collapsed_duplicates: self.collapsed_duplicates,
        }
    }

    fn require_paper(&self, id: PaperId) -> Result<()> {
        if self.papers.contains_key(&id) {
            Ok(())
        } else {
            Err(AppError::PaperNotFound { id: id.to_string() })
        }
    }
}

impl GraphStore for GraphSnapshot {
    fn snapshot_version(&self) -> &str {
        &self.version
    }

    fn paper(&self, id: PaperId) -> Result<&Paper> {
        self.papers
            .get(&id)
            .ok_or_else(|| AppError::PaperNotFound { id: id.to_string() })
    }

    fn author(&self, id: AuthorId) -> Result<&Author> {
        self.authors
            .get(&id)
            .ok_or_else(|| AppError::AuthorNotFound { id: id.to_string() })
    }

    fn citers_of(&self, id: PaperId) -> Result<&[PaperId]> {
        self.require_paper(id)?;
        Ok(self.incoming.get(&id).map(|v| v.as_slice()).unwrap_or(&[]))
    }

    fn cited_by(&self, id: PaperId) -> Result<&[PaperId]> {
        self.require_paper(id)?;
        Ok(self.outgoing.get(&id).map(|v| v.as_slice()).unwrap_or(&[]))
    }

    fn authors_of(&self, id: PaperId) -> Result<&[Authorship]> {
        self.require_paper(id)?;
        Ok(self.authorships.get(&id).map(|v| v.as_slice()).unwrap_or(&[]))
    }

    fn co_authors_of(&self, id: AuthorId) -> Result<BTreeSet<AuthorId>> {
        self.author(id)?;
        let co_authors = self
            .papers_of(id)
            .iter()
            .filter_map(|paper| self.authorships.get(paper))
            .flatten()
            .map(|a| a.author_id)
            .filter(|other| *other != id)
            .collect();
        Ok(co_authors)
    }

    fn papers_published_on_or_after(&self, date: NaiveDate) -> Vec<&Paper> {
        let mut papers: Vec<&Paper> = self
            .papers
            .values()
            .filter(|p| p.published_on.map_or(false, |d| d >= date))
            .collect();
        papers.sort_by(|a, b| a.published_on.cmp(&b.published_on).then(a.id.cmp(&b.id)));
        papers
    }

    fn papers(&self) -> Vec<&Paper> {
        self.papers.values().collect()
    }

    fn authors(&self) -> Vec<&Author> {
        self.authors.values().collect()
    }

    fn citations(&self) -> &[CitationEdge] {
        &self.citations
    }

    fn citation_type(&self, citing: PaperId, cited: PaperId) -> Option<CitationType> {
        self.edge_types.get(&(citing, cited)).copied()
    }
}
