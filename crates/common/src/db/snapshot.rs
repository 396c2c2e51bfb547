//! Snapshot loading from the relational store
//!
//! All four tables are read inside one read-only REPEATABLE READ
//! transaction, so the snapshot never mixes rows from before and after a
//! concurrent write. Malformed rows are skipped with a warning rather than
//! failing the whole load.

use super::models::*;
use super::DbPool;
use crate::errors::Result;
use crate::graph::{Author, CitationType, GraphSnapshot, Paper, SnapshotBuilder, SnapshotSource};
use sea_orm::{AccessMode, EntityTrait, IsolationLevel, TransactionTrait};
use std::collections::BTreeSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Loads snapshots through the read connection
pub struct DbSnapshotSource {
    pool: DbPool,
}

impl DbSnapshotSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for DbSnapshotSource {
    async fn load_snapshot(&self) -> Result<GraphSnapshot> {
        let txn = self
            .pool
            .read()
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await?;

        let papers = PaperEntity::find().all(&txn).await?;
        let authors = AuthorEntity::find().all(&txn).await?;
        let citations = CitationEntity::find().all(&txn).await?;
        let authorships = PaperAuthorEntity::find().all(&txn).await?;

        txn.commit().await?;

        let version = Uuid::now_v7().to_string();
        info!(
            version = %version,
            papers = papers.len(),
            authors = authors.len(),
            citations = citations.len(),
            authorships = authorships.len(),
            "Loaded snapshot rows"
        );

        Ok(build_snapshot(version, papers, authors, citations, authorships))
    }
}

/// Convert raw rows into a snapshot
pub fn build_snapshot(
    version: String,
    papers: Vec<PaperRow>,
    authors: Vec<AuthorRow>,
    citations: Vec<CitationRow>,
    authorships: Vec<PaperAuthorRow>,
) -> GraphSnapshot {
    let mut builder = SnapshotBuilder::new(version);

    for row in papers {
        builder.add_paper(paper_from_row(row));
    }

    for row in authors {
        let mut author = Author::new(row.id, row.name).with_h_index(row.h_index.max(0) as u32);
        author.affiliation = row.affiliation.filter(|a| !a.trim().is_empty());
        builder.add_author(author);
    }

    for row in citations {
        builder.add_citation(
            row.citing_paper_id,
            row.cited_paper_id,
            CitationType::parse(&row.citation_type),
        );
    }

    for row in authorships {
        if row.author_position < 0 {
            warn!(
                paper_id = %row.paper_id,
                author_id = %row.author_id,
                "Skipping authorship with negative position"
            );
            continue;
        }
        let position = row.author_position as u32;
        if let Err(e) = builder.add_authorship(row.paper_id, row.author_id, position) {
            warn!(error = %e, "Skipping conflicting authorship");
        }
    }

    builder.build()
}

fn paper_from_row(row: PaperRow) -> Paper {
    let keywords = match serde_json::from_value::<Vec<String>>(row.keywords) {
        Ok(list) => list
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect(),
        Err(e) => {
            warn!(paper_id = %row.id, error = %e, "Ignoring malformed keyword list");
            BTreeSet::new()
        }
    };

    Paper {
        id: row.id,
        title: row.title,
        abstract_text: row.abstract_text,
        published_on: row.publication_date,
        citation_count: row.citation_count.max(0) as u32,
        keywords,
        journal: row.journal,
        doi: row.doi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    fn paper_row(n: u128, keywords: serde_json::Value) -> PaperRow {
        let now = Utc::now().fixed_offset();
        PaperRow {
            id: Uuid::from_u128(n),
            title: format!("Paper {}", n),
            abstract_text: String::new(),
            publication_date: NaiveDate::from_ymd_opt(2023, 3, 1),
            journal: None,
            doi: None,
            citation_count: -3,
            keywords,
            created_at: now,
            updated_at: now,
        }
    }

    fn citation_row(citing: u128, cited: u128, kind: &str) -> CitationRow {
        CitationRow {
            id: Uuid::new_v4(),
            citing_paper_id: Uuid::from_u128(citing),
            cited_paper_id: Uuid::from_u128(cited),
            citation_type: kind.to_string(),
            citation_context: None,
            created_at: Utc::now().fixed_offset(),
        }
    }

    fn authorship_row(paper: u128, author: u128, position: i32) -> PaperAuthorRow {
        PaperAuthorRow {
            paper_id: Uuid::from_u128(paper),
            author_id: Uuid::from_u128(author),
            author_position: position,
        }
    }

    #[test]
    fn test_build_snapshot_from_rows() {
        let papers = vec![
            paper_row(1, json!(["Solid-State", " anode "])),
            paper_row(2, json!({"not": "a list"})),
        ];
        let authors = vec![AuthorRow {
            id: Uuid::from_u128(10),
            name: "Ana Chen".into(),
            email: None,
            affiliation: Some("  ".into()),
            orcid: None,
            h_index: 12,
            created_at: Utc::now().fixed_offset(),
        }];
        let citations = vec![
            citation_row(2, 1, "methodological"),
            citation_row(2, 2, "direct"),
        ];
        let authorships = vec![
            authorship_row(1, 10, 0),
            authorship_row(1, 11, 0),
            authorship_row(2, 10, -1),
        ];

        let snapshot = build_snapshot("v-test".into(), papers, authors, citations, authorships);

        let first = snapshot.paper(Uuid::from_u128(1)).unwrap();
        assert_eq!(first.citation_count, 0);
        assert!(first.keywords.contains("solid-state"));
        assert!(first.keywords.contains("anode"));
        assert!(snapshot.paper(Uuid::from_u128(2)).unwrap().keywords.is_empty());

        assert_eq!(snapshot.citation_count(), 1);
        assert_eq!(
            snapshot.citation_type(Uuid::from_u128(2), Uuid::from_u128(1)),
            Some(CitationType::Methodological)
        );
        assert_eq!(snapshot.authors_of(Uuid::from_u128(1)).unwrap().len(), 1);
        assert!(snapshot.authors_of(Uuid::from_u128(2)).unwrap().is_empty());
        assert_eq!(snapshot.author(Uuid::from_u128(10)).unwrap().affiliation, None);
    }
}
