//! Report assembly
//!
//! Turns ranked engine output into 1-based ranked, paginated sections and
//! merges the per-engine envelopes into one `AnalysisReport`.

use crate::collaboration::AuthorMetrics;
use crate::influence::InfluenceScore;
use crate::outcome::{AnalysisResponse, Status};
use crate::similarity::SimilarityResult;
use crate::trends::TrendSeries;
use litgraph_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

/// An item with its 1-based position in the full ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked<T> {
    pub rank: usize,
    #[serde(flatten)]
    pub item: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub items: Vec<Ranked<T>>,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }
}

/// Which slice of a ranking to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

/// Rank `items` in their given order and cut out one page.
///
/// Pages past the end come back empty rather than failing.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Result<Page<T>> {
    if request.page == 0 {
        return Err(AppError::invalid_parameter("page", "pages are numbered from 1"));
    }
    if request.page_size == 0 {
        return Err(AppError::invalid_parameter("page_size", "must be greater than 0"));
    }

    let total_items = items.len();
    let total_pages = total_items.div_ceil(request.page_size);
    let skip = (request.page - 1).saturating_mul(request.page_size);

    let items = items
        .into_iter()
        .enumerate()
        .skip(skip)
        .take(request.page_size)
        .map(|(i, item)| Ranked { rank: i + 1, item })
        .collect();

    Ok(Page {
        page: request.page,
        page_size: request.page_size,
        total_items,
        total_pages,
        items,
    })
}

/// Paginate the data of an envelope; a pagination failure turns it into an error
pub fn paginate_response<T>(
    response: AnalysisResponse<Vec<T>>,
    request: PageRequest,
) -> AnalysisResponse<Page<T>> {
    match response.data {
        Some(items) => match paginate(items, request) {
            Ok(page) => AnalysisResponse {
                status: response.status,
                snapshot_version: response.snapshot_version,
                cache_key: response.cache_key,
                data: Some(page),
                warnings: response.warnings,
                error: None,
            },
            Err(err) => AnalysisResponse::from_result(Err(err)),
        },
        None => AnalysisResponse {
            status: response.status,
            snapshot_version: response.snapshot_version,
            cache_key: response.cache_key,
            data: None,
            warnings: response.warnings,
            error: response.error,
        },
    }
}

/// Combined output of several analyses over one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub influence: Option<AnalysisResponse<Page<InfluenceScore>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<AnalysisResponse<Page<TrendSeries>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaboration: Option<AnalysisResponse<Page<AuthorMetrics>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<AnalysisResponse<Page<SimilarityResult>>>,
}

#[derive(Debug, Default)]
pub struct ReportAssembler {
    request: PageRequest,
    influence: Option<AnalysisResponse<Page<InfluenceScore>>>,
    trends: Option<AnalysisResponse<Page<TrendSeries>>>,
    collaboration: Option<AnalysisResponse<Page<AuthorMetrics>>>,
    similarity: Option<AnalysisResponse<Page<SimilarityResult>>>,
}

impl ReportAssembler {
    pub fn new(request: PageRequest) -> Self {
        Self {
            request,
            ..Default::default()
        }
    }

    pub fn influence(mut self, response: AnalysisResponse<Vec<InfluenceScore>>) -> Self {
        self.influence = Some(paginate_response(response, self.request));
        self
    }

    pub fn trends(mut self, response: AnalysisResponse<Vec<TrendSeries>>) -> Self {
        self.trends = Some(paginate_response(response, self.request));
        self
    }

    pub fn collaboration(mut self, response: AnalysisResponse<Vec<AuthorMetrics>>) -> Self {
        self.collaboration = Some(paginate_response(response, self.request));
        self
    }

    pub fn similarity(mut self, response: AnalysisResponse<Vec<SimilarityResult>>) -> Self {
        self.similarity = Some(paginate_response(response, self.request));
        self
    }

    /// Status is the worst of the included sections
    pub fn assemble(self) -> AnalysisReport {
        let status = Status::worst(
            [
                self.influence.as_ref().map(|s| s.status),
                self.trends.as_ref().map(|s| s.status),
                self.collaboration.as_ref().map(|s| s.status),
                self.similarity.as_ref().map(|s| s.status),
            ]
            .into_iter()
            .flatten(),
        );

        AnalysisReport {
            status,
            influence: self.influence,
            trends: self.trends,
            collaboration: self.collaboration,
            similarity: self.similarity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Analysis, Outcome, Warning};
    use litgraph_common::errors::ErrorCode;

    fn response<T>(data: T, warnings: Vec<Warning>) -> AnalysisResponse<T> {
        let outcome = Outcome::with_warnings(data, warnings);
        let analysis = Analysis::from_outcome(outcome, "v1".into(), "key".into(), 3);
        AnalysisResponse::from_result(Ok(analysis))
    }

    #[test]
    fn test_paginate_ranks_are_global() {
        let letters = vec!['a', 'b', 'c', 'd', 'e'];
        let page = paginate(letters.clone(), PageRequest { page: 2, page_size: 2 }).unwrap();
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].rank, 3);
        assert_eq!(page.items[0].item, 'c');
        assert!(!page.is_last());

        let last = paginate(letters, PageRequest { page: 3, page_size: 2 }).unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(last.is_last());
    }

    #[test]
    fn test_paginate_edges() {
        let beyond = paginate(vec![1, 2, 3], PageRequest { page: 9, page_size: 2 }).unwrap();
        assert!(beyond.items.is_empty());

        let empty = paginate(Vec::<u8>::new(), PageRequest::default()).unwrap();
        assert_eq!(empty.total_pages, 0);

        let err = paginate(vec![1], PageRequest { page: 0, page_size: 2 }).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert!(paginate(vec![1], PageRequest { page: 1, page_size: 0 }).is_err());
    }

    #[test]
    fn test_report_status_is_worst_section() {
        let report = ReportAssembler::new(PageRequest::default())
            .influence(response(Vec::new(), Vec::new()))
            .trends(response(Vec::new(), vec![Warning::timeout("trends", 1, 4)]))
            .assemble();
        assert_eq!(report.status, Status::Partial);
        assert!(report.collaboration.is_none());

        let err = AppError::invalid_parameter("top_k", "must be at least 1");
        let failed: AnalysisResponse<Vec<SimilarityResult>> =
            AnalysisResponse::from_result(Err(err));
        let report = ReportAssembler::new(PageRequest::default())
            .influence(response(Vec::new(), Vec::new()))
            .similarity(failed)
            .assemble();
        assert_eq!(report.status, Status::Error);
        let similarity = report.similarity.unwrap();
        assert!(similarity.data.is_none());
        assert_eq!(similarity.error.unwrap().code, ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_bad_page_request_fails_the_section() {
        let report = ReportAssembler::new(PageRequest { page: 0, page_size: 10 })
            .influence(response(Vec::new(), Vec::new()))
            .assemble();
        assert_eq!(report.status, Status::Error);
    }

    #[test]
    fn test_empty_report_is_ok() {
        let report = ReportAssembler::default().assemble();
        assert_eq!(report.status, Status::Ok);
    }
}
