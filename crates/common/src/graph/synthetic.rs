//! Seeded synthetic literature graphs
//!
//! Generates battery-research-flavoured snapshots with realistic shape:
//! publication volume growing year over year, newer papers citing older
//! ones with preferential attachment, and authors clustered by institution.
//! The same seed always yields the same snapshot.

use super::{Author, CitationType, GraphSnapshot, Paper, SnapshotBuilder};
use chrono::NaiveDate;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use tracing::debug;
use uuid::Uuid;

const KEYWORDS: &[&str] = &[
    "lithium-ion", "capacity", "degradation", "cycling", "electrolyte",
    "solid-state", "anode", "cathode", "silicon", "graphite",
    "dendrite", "impedance", "thermal-runaway", "sodium-ion", "separator",
    "state-of-charge", "state-of-health", "fast-charging", "interphase", "nickel-rich",
    "recycling", "cobalt-free", "modeling", "machine-learning", "calendar-aging",
];

const METHODS: &[&str] = &[
    "electrochemical impedance spectroscopy", "galvanostatic cycling", "machine learning",
    "density functional theory", "in situ X-ray diffraction", "finite element modeling",
    "cryo-electron microscopy", "differential capacity analysis",
];

const INSTITUTIONS: &[&str] = &[
    "MIT", "Stanford University", "University of Cambridge", "Toyota Research Institute",
    "CATL", "Argonne National Laboratory", "KIT", "Tsinghua University",
    "University of Oxford", "Samsung SDI",
];

const JOURNALS: &[&str] = &[
    "Journal of Power Sources", "Nature Energy", "Advanced Energy Materials",
    "Joule", "Energy Storage Materials", "Journal of The Electrochemical Society",
];

const FIRST_NAMES: &[&str] = &[
    "Ana", "Wei", "Lars", "Priya", "Kenji", "Maria", "Tomas", "Aisha", "Jun", "Elena",
];
const LAST_NAMES: &[&str] = &[
    "Chen", "Novak", "Okafor", "Schmidt", "Tanaka", "Rossi", "Kim", "Silva", "Patel", "Berg",
];

/// Shape of the generated graph
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub authors: usize,
    pub papers: usize,
    pub start_year: i32,
    pub end_year: i32,
    /// Maximum references per paper (bounded by the number of older papers)
    pub max_references: usize,
    /// Maximum authors per paper
    pub max_authors_per_paper: usize,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            authors: 200,
            papers: 1_000,
            start_year: 2010,
            end_year: 2024,
            max_references: 25,
            max_authors_per_paper: 5,
            seed: 42,
        }
    }
}

/// Synthetic snapshot generator
pub struct SyntheticGraph {
    config: SyntheticConfig,
    rng: StdRng,
}

impl SyntheticGraph {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    /// Generate a snapshot with the default shape and the given seed
    pub fn generate_with_seed(seed: u64) -> GraphSnapshot {
        Self::new(SyntheticConfig { seed, ..SyntheticConfig::default() }).generate()
    }

    /// Generate the snapshot
    pub fn generate(mut self) -> GraphSnapshot {
        let authors = self.generate_authors();
        let mut papers = self.generate_papers();
        papers.sort_by(|a, b| a.published_on.cmp(&b.published_on).then(a.id.cmp(&b.id)));

        let citations = self.generate_citations(papers.len());
        let mut in_degree = vec![0u32; papers.len()];
        for &(_, cited, _) in &citations {
            in_degree[cited] += 1;
        }

        let mut builder = SnapshotBuilder::new(format!("synthetic-{}", self.config.seed));
        for author in &authors {
            builder.add_author(author.clone());
        }
        for (idx, paper) in papers.iter_mut().enumerate() {
            // Stored counts also include citers outside the snapshot
            paper.citation_count = in_degree[idx] + self.rng.gen_range(0..5);
        }
        for &(citing, cited, citation_type) in &citations {
            builder.add_citation(papers[citing].id, papers[cited].id, citation_type);
        }
        for paper in &papers {
            for (position, author_idx) in self.pick_authors(authors.len()).into_iter().enumerate() {
                let author = authors[author_idx].id;
                if let Err(err) = builder.add_authorship(paper.id, author, position as u32) {
                    debug!(paper = %paper.id, error = %err, "Skipped generated authorship");
                }
            }
        }
        for paper in papers {
            builder.add_paper(paper);
        }
        builder.build()
    }

    fn uuid(&mut self) -> Uuid {
        Uuid::from_u128(self.rng.gen())
    }

    fn generate_authors(&mut self) -> Vec<Author> {
        (0..self.config.authors)
            .map(|i| {
                let first = FIRST_NAMES[self.rng.gen_range(0..FIRST_NAMES.len())];
                let last = LAST_NAMES[self.rng.gen_range(0..LAST_NAMES.len())];
                // Cluster authors by institution so collaborations have structure
                let institution = INSTITUTIONS[i % INSTITUTIONS.len()];
                let h_index = (self.rng.gen::<f64>().powi(3) * 80.0) as u32;
                Author::new(self.uuid(), format!("{} {}", first, last))
                    .with_affiliation(institution)
                    .with_h_index(h_index)
            })
            .collect()
    }

    fn generate_papers(&mut self) -> Vec<Paper> {
        let years: Vec<i32> = (self.config.start_year..=self.config.end_year).collect();
        let weights: Vec<f64> = years
            .iter()
            .map(|y| 1.15f64.powi(y - self.config.start_year))
            .collect();
        let year_dist = WeightedIndex::new(&weights).ok();

        (0..self.config.papers)
            .map(|i| {
                let year = match &year_dist {
                    Some(dist) => years[dist.sample(&mut self.rng)],
                    None => self.config.start_year,
                };
                let date = NaiveDate::from_ymd_opt(year, 1, 1)
                    .and_then(|d| d.checked_add_days(chrono::Days::new(self.rng.gen_range(0..365))))
                    .unwrap_or(NaiveDate::MIN);

                let count = self.rng.gen_range(3..=7);
                let keywords: Vec<&str> =
                    KEYWORDS.choose_multiple(&mut self.rng, count).copied().collect();
                let method = METHODS[self.rng.gen_range(0..METHODS.len())];
                let journal = JOURNALS[self.rng.gen_range(0..JOURNALS.len())];

                let title = self.title(&keywords, method);
                let abstract_text = format!(
                    "This study investigates {} for {} in {} cells. We demonstrate that {} \
                     improves {} compared to conventional baselines.",
                    method, keywords[0], keywords[1], keywords[2], keywords[keywords.len() - 1]
                );

                let mut paper = Paper::new(self.uuid(), title)
                    .with_abstract(abstract_text)
                    .published(date)
                    .with_keywords(keywords.iter().copied());
                paper.journal = Some(journal.to_string());
                paper.doi = Some(format!("10.5555/litgraph.{}.{}", self.config.seed, i));
                paper
            })
            .collect()
    }

    fn title(&mut self, keywords: &[&str], method: &str) -> String {
        match self.rng.gen_range(0..3) {
            0 => format!(
                "{} for {} {}: a {} study",
                capitalize(method),
                keywords[0],
                keywords[1],
                keywords[2]
            ),
            1 => format!("Enhanced {} in {} through {}", keywords[0], keywords[1], method),
            _ => format!("Investigating {} in {} using {}", keywords[0], keywords[1], method),
        }
    }

    /// Citations as (citing index, cited index, type) over date-sorted papers
    fn generate_citations(&mut self, paper_count: usize) -> Vec<(usize, usize, CitationType)> {
        let mut in_degree = vec![0usize; paper_count];
        let mut citations = Vec::new();

        for citing in 1..paper_count {
            let wanted = self.rng.gen_range(0..=self.config.max_references).min(citing);
            if wanted == 0 {
                continue;
            }
            let weights: Vec<usize> = in_degree[..citing].iter().map(|d| d + 1).collect();
            let Ok(dist) = WeightedIndex::new(&weights) else {
                continue;
            };

            let mut chosen = Vec::with_capacity(wanted);
            // Bounded retries: popular papers get drawn repeatedly
            for _ in 0..wanted * 4 {
                if chosen.len() == wanted {
                    break;
                }
                let cited = dist.sample(&mut self.rng);
                if !chosen.contains(&cited) {
                    chosen.push(cited);
                }
            }

            for cited in chosen {
                in_degree[cited] += 1;
                let type_idx = self.rng.gen_range(0..CitationType::ALL.len());
                let citation_type = CitationType::ALL[type_idx];
                citations.push((citing, cited, citation_type));
            }
        }
        citations
    }

    /// Author indices for one paper; co-authors lean towards the lead's institution
    fn pick_authors(&mut self, author_count: usize) -> Vec<usize> {
        if author_count == 0 {
            return Vec::new();
        }
        let max_authors = self.config.max_authors_per_paper.max(1);
        let wanted = self.rng.gen_range(1..=max_authors).min(author_count);
        let lead = self.rng.gen_range(0..author_count);
        let mut picked = vec![lead];

        for _ in 0..wanted * 4 {
            if picked.len() == wanted {
                break;
            }
            let candidate = if self.rng.gen_bool(0.7) {
                // Same institution: indices congruent modulo the institution count
                let stride = INSTITUTIONS.len();
                let slots = (author_count + stride - 1 - lead % stride) / stride;
                (lead % stride) + stride * self.rng.gen_range(0..slots.max(1))
            } else {
                self.rng.gen_range(0..author_count)
            };
            if candidate < author_count && !picked.contains(&candidate) {
                picked.push(candidate);
            }
        }
        picked
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
