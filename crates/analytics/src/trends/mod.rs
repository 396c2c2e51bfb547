//! Research trend analysis
//!
//! Counts papers per (keyword, bucket) inside a window, zero-fills empty
//! buckets, and labels each bucket from its moving averages and growth.
//! Papers without stored keywords fall back to the keyword extractor.

mod buckets;
mod classify;

pub use buckets::{BucketGrid, BucketSize, BucketUnit, Period, TimeWindow, MAX_BUCKETS};
pub use classify::{classify, growth_rates, moving_average, TrendLabel, TrendThresholds};

use crate::deadline::Deadline;
use crate::outcome::{Outcome, Warning};
use litgraph_common::errors::{AppError, Result};
use litgraph_common::graph::{GraphStore, Paper};
use litgraph_common::keywords::KeywordExtractor;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};
use validator::Validate;

/// Keywords handled per deadline check in `analyze_all`
const KEYWORD_CHUNK: usize = 256;

/// Papers scanned per deadline check
const PAPER_CHUNK: usize = 1024;

/// Trend parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TrendParams {
    pub window: TimeWindow,

    pub bucket: BucketSize,

    /// Moving-average window sizes in buckets; the first one drives the
    /// emerging baseline
    #[validate(length(min = 1))]
    pub moving_average_windows: Vec<usize>,

    pub thresholds: TrendThresholds,
}

impl TrendParams {
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.bucket.validate()?;
        self.thresholds.check()?;
        if self.moving_average_windows.iter().any(|w| *w == 0) {
            return Err(AppError::invalid_parameter(
                "moving_average_windows",
                "window sizes must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingAverage {
    pub window: usize,
    pub value: f64,
}

/// One bucket of a keyword's series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub keyword: String,
    pub period: Period,
    pub count: u32,
    pub moving_averages: Vec<MovingAverage>,
    pub growth: f64,
    pub label: TrendLabel,
}

/// Ordered points for one keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub keyword: String,
    pub bucket: BucketSize,
    pub points: Vec<TrendPoint>,
}

/// Compact view of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub keyword: String,
    pub total: u64,
    pub latest_label: Option<TrendLabel>,
    /// Earliest bucket with the highest count
    pub peak: Option<Period>,
    pub peak_count: u32,
}

impl TrendSeries {
    pub fn summary(&self) -> TrendSummary {
        let peak = self
            .points
            .iter()
            .fold(None::<&TrendPoint>, |best, p| match best {
                Some(b) if b.count >= p.count => Some(b),
                _ => Some(p),
            });
        TrendSummary {
            keyword: self.keyword.clone(),
            total: self.points.iter().map(|p| u64::from(p.count)).sum(),
            latest_label: self.points.last().map(|p| p.label),
            peak: peak.map(|p| p.period),
            peak_count: peak.map_or(0, |p| p.count),
        }
    }
}

/// Trend analyzer over one snapshot
pub struct TrendAnalyzer<'a> {
    store: &'a dyn GraphStore,
    extractor: &'a dyn KeywordExtractor,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(store: &'a dyn GraphStore, extractor: &'a dyn KeywordExtractor) -> Self {
        Self { store, extractor }
    }

    /// Series for a single keyword.
    ///
    /// When the deadline expires mid-scan the series covers the papers
    /// counted so far and carries a timeout warning.
    pub fn analyze(
        &self,
        keyword: &str,
        params: &TrendParams,
        deadline: &Deadline,
    ) -> Result<Outcome<TrendSeries>> {
        params.check()?;
        let keyword = normalize_keyword(keyword)?;
        let grid = BucketGrid::new(params.window, params.bucket)?;

        let mut counts = vec![0u32; grid.len()];
        let cut_short = self.scan_window(params.window, &grid, deadline, |paper, bucket| {
            if self.keywords_of(paper).contains(&keyword) {
                counts[bucket] += 1;
            }
        });

        debug!(keyword = %keyword, buckets = grid.len(), "Keyword trend counted");
        let series = build_series(keyword, &counts, &grid, params);
        Ok(Outcome::with_warnings(series, cut_short.into_iter().collect()))
    }

    /// Series for every keyword seen in the window at least `min_total` times,
    /// ordered by keyword
    pub fn analyze_all(
        &self,
        params: &TrendParams,
        min_total: u32,
        deadline: &Deadline,
    ) -> Result<Outcome<Vec<TrendSeries>>> {
        params.check()?;
        let grid = BucketGrid::new(params.window, params.bucket)?;

        let mut counts: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let cut_short = self.scan_window(params.window, &grid, deadline, |paper, bucket| {
            for keyword in self.keywords_of(paper).iter() {
                counts
                    .entry(keyword.clone())
                    .or_insert_with(|| vec![0; grid.len()])[bucket] += 1;
            }
        });
        if let Some(warning) = cut_short {
            return Ok(Outcome::with_warnings(Vec::new(), vec![warning]));
        }

        let selected: Vec<(String, Vec<u32>)> = counts
            .into_iter()
            .filter(|(_, c)| c.iter().map(|n| u64::from(*n)).sum::<u64>() >= u64::from(min_total))
            .collect();

        let total = selected.len();
        let mut series = Vec::with_capacity(total);
        let mut warnings = Vec::new();

        for chunk in selected.chunks(KEYWORD_CHUNK) {
            if deadline.is_expired() {
                warn!(completed = series.len(), total, "Trend analysis hit the deadline");
                warnings.push(Warning::timeout("trends", series.len(), total));
                break;
            }
            let built: Vec<TrendSeries> = chunk
                .par_iter()
                .map(|(keyword, counts)| build_series(keyword.clone(), counts, &grid, params))
                .collect();
            series.extend(built);
        }

        debug!(keywords = series.len(), buckets = grid.len(), "Trend series computed");
        Ok(Outcome::with_warnings(series, warnings))
    }

    /// Feed window papers to `visit` chunk by chunk; returns a timeout
    /// warning when the deadline stops the scan early
    fn scan_window<F>(
        &self,
        window: TimeWindow,
        grid: &BucketGrid,
        deadline: &Deadline,
        mut visit: F,
    ) -> Option<Warning>
    where
        F: FnMut(&'a Paper, usize),
    {
        let papers = self.papers_in_window(window, grid);
        let total = papers.len();
        for (i, chunk) in papers.chunks(PAPER_CHUNK).enumerate() {
            if deadline.is_expired() {
                let completed = i * PAPER_CHUNK;
                warn!(completed, total, "Trend scan hit the deadline");
                return Some(Warning::timeout("trends", completed, total));
            }
            for &(paper, bucket) in chunk {
                visit(paper, bucket);
            }
        }
        None
    }

    /// Dated papers inside the window with their bucket
    fn papers_in_window(&self, window: TimeWindow, grid: &BucketGrid) -> Vec<(&'a Paper, usize)> {
        let store: &'a dyn GraphStore = self.store;
        store
            .papers_published_on_or_after(window.start)
            .into_iter()
            .take_while(|p| p.published_on.map_or(false, |d| d <= window.end))
            .filter_map(|p| p.published_on.and_then(|d| grid.locate(d)).map(|bucket| (p, bucket)))
            .collect()
    }

    fn keywords_of<'p>(&self, paper: &'p Paper) -> Cow<'p, BTreeSet<String>> {
        if paper.keywords.is_empty() {
            Cow::Owned(self.extractor.extract(&paper.text()))
        } else {
            Cow::Borrowed(&paper.keywords)
        }
    }
}

fn normalize_keyword(keyword: &str) -> Result<String> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(AppError::invalid_parameter("keyword", "must not be empty"));
    }
    Ok(keyword)
}

fn build_series(
    keyword: String,
    counts: &[u32],
    grid: &BucketGrid,
    params: &TrendParams,
) -> TrendSeries {
    let averages: Vec<Vec<f64>> = params
        .moving_average_windows
        .iter()
        .map(|w| moving_average(counts, *w))
        .collect();
    let growth = growth_rates(counts);
    let labels = classify(&growth, &averages[0], &params.thresholds);

    let points = counts
        .iter()
        .enumerate()
        .map(|(t, count)| TrendPoint {
            keyword: keyword.clone(),
            period: grid.period(t),
            count: *count,
            moving_averages: params
                .moving_average_windows
                .iter()
                .zip(&averages)
                .map(|(window, values)| MovingAverage {
                    window: *window,
                    value: values[t],
                })
                .collect(),
            growth: growth[t],
            label: labels[t],
        })
        .collect();

    TrendSeries {
        keyword,
        bucket: params.bucket,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use litgraph_common::graph::{GraphSnapshot, SnapshotBuilder};
    use litgraph_common::keywords::StopwordExtractor;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn params() -> TrendParams {
        TrendParams {
            window: TimeWindow::new(date(2023, 1, 1), date(2023, 6, 30)),
            bucket: BucketSize::months(1),
            moving_average_windows: vec![3, 6],
            thresholds: TrendThresholds::default(),
        }
    }

    /// Monthly "solid-state" counts [2, 2, 2, 3, 6, 9] plus one "anode" paper per month
    fn solid_state_snapshot() -> GraphSnapshot {
        let mut builder = SnapshotBuilder::new("v1");
        let mut n = 0u128;
        for (month, count) in [2u32, 2, 2, 3, 6, 9].iter().enumerate() {
            for day in 0..*count {
                n += 1;
                builder.add_paper(
                    litgraph_common::graph::Paper::new(Uuid::from_u128(n), "Electrolyte study")
                        .published(date(2023, month as u32 + 1, day + 1))
                        .with_keywords(["solid-state", "electrolyte"]),
                );
            }
            n += 1;
            builder.add_paper(
                litgraph_common::graph::Paper::new(Uuid::from_u128(n), "Silicon anode cycling")
                    .published(date(2023, month as u32 + 1, 20)),
            );
        }
        // Outside the window
        builder.add_paper(
            litgraph_common::graph::Paper::new(Uuid::from_u128(1_000), "Late")
                .published(date(2023, 7, 1))
                .with_keywords(["solid-state"]),
        );
        builder.build()
    }

    #[test]
    fn test_solid_state_scenario() {
        let snapshot = solid_state_snapshot();
        let extractor = StopwordExtractor::default();
        let analyzer = TrendAnalyzer::new(&snapshot, &extractor);

        let series = analyzer.analyze(" Solid-State ", &params(), &Deadline::none()).unwrap().data;
        let counts: Vec<u32> = series.points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![2, 2, 2, 3, 6, 9]);

        let labels: Vec<TrendLabel> = series.points.iter().map(|p| p.label).collect();
        assert_eq!(&labels[4..], &[TrendLabel::Emerging, TrendLabel::Emerging]);
        assert!(labels[..4].iter().all(|l| *l == TrendLabel::Stable));

        let last = series.points.last().unwrap();
        assert_eq!(last.moving_averages[0].window, 3);
        assert!((last.moving_averages[0].value - 6.0).abs() < 1e-12);
        assert!((last.moving_averages[1].value - 24.0 / 6.0).abs() < 1e-12);
        assert_eq!(last.period.start, date(2023, 6, 1));
    }

    #[test]
    fn test_zero_fill_and_extractor_fallback() {
        let snapshot = solid_state_snapshot();
        let extractor = StopwordExtractor::default();
        let analyzer = TrendAnalyzer::new(&snapshot, &extractor);

        // "anode" is never stored; it comes from the titles
        let series = analyzer.analyze("anode", &params(), &Deadline::none()).unwrap().data;
        assert!(series.points.iter().all(|p| p.count == 1));

        let series = analyzer.analyze("graphene", &params(), &Deadline::none()).unwrap().data;
        assert_eq!(series.points.len(), 6);
        assert!(series.points.iter().all(|p| p.count == 0 && p.label == TrendLabel::Stable));
    }

    #[test]
    fn test_analyze_all_with_min_total() {
        let snapshot = solid_state_snapshot();
        let extractor = StopwordExtractor::default();
        let analyzer = TrendAnalyzer::new(&snapshot, &extractor);

        let outcome = analyzer.analyze_all(&params(), 10, &Deadline::none()).unwrap();
        let keywords: Vec<&str> = outcome.data.iter().map(|s| s.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["electrolyte", "solid-state"]);

        let summary = outcome.data[1].summary();
        assert_eq!(summary.total, 24);
        assert_eq!(summary.latest_label, Some(TrendLabel::Emerging));
        assert_eq!(summary.peak_count, 9);
    }

    #[test]
    fn test_analyze_all_respects_deadline() {
        let snapshot = solid_state_snapshot();
        let extractor = StopwordExtractor::default();
        let deadline = Deadline::none();
        deadline.cancel();

        let outcome = TrendAnalyzer::new(&snapshot, &extractor)
            .analyze_all(&params(), 1, &deadline)
            .unwrap();
        assert!(outcome.data.is_empty());
        assert!(matches!(outcome.warnings[0], Warning::Timeout { completed: 0, .. }));
    }

    #[test]
    fn test_analyze_keyword_respects_deadline() {
        let snapshot = solid_state_snapshot();
        let extractor = StopwordExtractor::default();
        let deadline = Deadline::none();
        deadline.cancel();

        let outcome = TrendAnalyzer::new(&snapshot, &extractor)
            .analyze("solid-state", &params(), &deadline)
            .unwrap();
        assert_eq!(outcome.data.points.len(), 6);
        assert!(outcome.data.points.iter().all(|p| p.count == 0));
        assert!(matches!(
            outcome.warnings[0],
            Warning::Timeout { completed: 0, total: 30, .. }
        ));
        assert_eq!(outcome.status(), crate::outcome::Status::Partial);
    }

    #[test]
    fn test_invalid_parameters() {
        let snapshot = GraphSnapshot::empty("v1");
        let extractor = StopwordExtractor::default();
        let analyzer = TrendAnalyzer::new(&snapshot, &extractor);

        let mut p = params();
        p.moving_average_windows = vec![3, 0];
        assert!(analyzer.analyze("anode", &p, &Deadline::none()).is_err());

        let mut p = params();
        p.moving_average_windows.clear();
        assert!(analyzer.analyze("anode", &p, &Deadline::none()).is_err());

        let mut p = params();
        p.bucket.count = 0;
        assert!(analyzer.analyze("anode", &p, &Deadline::none()).is_err());

        assert!(analyzer.analyze("  ", &params(), &Deadline::none()).is_err());
    }
}
