//! Result envelopes
//!
//! Engines return an `Outcome`: their data plus any soft warnings. The
//! service wraps that into an `Analysis` (snapshot version, cache key,
//! status) and hosting layers turn `Result<Analysis<T>>` into an
//! `AnalysisResponse` that always carries `ok`, `partial` or `error`.

use litgraph_common::errors::{AppError, ErrorCode, Result};
use serde::{Deserialize, Serialize};

/// Response status, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Partial,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Partial => "partial",
            Status::Error => "error",
        }
    }

    /// Worst of several statuses; `Ok` for none
    pub fn worst<I: IntoIterator<Item = Status>>(statuses: I) -> Status {
        statuses.into_iter().max().unwrap_or(Status::Ok)
    }
}

/// Soft condition attached to a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// An iterative stage hit its cap without stabilizing
    Convergence {
        stage: String,
        iterations: usize,
        /// Largest remaining change when the cap was hit
        residual: f64,
    },

    /// The deadline passed; the result covers `completed` of `total` steps
    Timeout { stage: String, completed: usize, total: usize },

    /// A referenced entity was absent and the affected item was skipped
    DataGap { entity: String, id: String, detail: String },
}

impl Warning {
    pub fn convergence(stage: &str, iterations: usize, residual: f64) -> Self {
        Warning::Convergence {
            stage: stage.to_string(),
            iterations,
            residual,
        }
    }

    pub fn timeout(stage: &str, completed: usize, total: usize) -> Self {
        Warning::Timeout {
            stage: stage.to_string(),
            completed,
            total,
        }
    }

    pub fn data_gap(entity: &str, id: impl ToString, detail: impl Into<String>) -> Self {
        Warning::DataGap {
            entity: entity.to_string(),
            id: id.to_string(),
            detail: detail.into(),
        }
    }

    /// Whether this warning makes the result partial.
    ///
    /// Skipped dangling references leave the rest of the result complete.
    pub fn is_partial(&self) -> bool {
        !matches!(self, Warning::DataGap { .. })
    }
}

/// Engine output: data plus warnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub data: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(data: T, warnings: Vec<Warning>) -> Self {
        Self { data, warnings }
    }

    /// `Partial` if any warning is a convergence or timeout warning
    pub fn status(&self) -> Status {
        if self.warnings.iter().any(Warning::is_partial) {
            Status::Partial
        } else {
            Status::Ok
        }
    }

    pub fn data_gaps(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::DataGap { .. }))
            .count()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            data: f(self.data),
            warnings: self.warnings,
        }
    }
}

/// A completed analysis as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis<T> {
    pub status: Status,

    /// Snapshot the analysis ran against
    pub snapshot_version: String,

    /// Key a caller should cache this result under
    pub cache_key: String,

    pub data: T,

    pub warnings: Vec<Warning>,

    pub elapsed_ms: u64,
}

impl<T> Analysis<T> {
    pub fn from_outcome(
        outcome: Outcome<T>,
        snapshot_version: String,
        cache_key: String,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            status: outcome.status(),
            snapshot_version,
            cache_key,
            data: outcome.data,
            warnings: outcome.warnings,
            elapsed_ms,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Analysis<U> {
        Analysis {
            status: self.status,
            snapshot_version: self.snapshot_version,
            cache_key: self.cache_key,
            data: f(self.data),
            warnings: self.warnings,
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// Typed reason attached to an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub numeric_code: u16,
    pub message: String,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        let code = err.code();
        Self {
            code,
            numeric_code: code.as_code(),
            message: err.to_string(),
        }
    }
}

/// Transport-neutral response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse<T> {
    pub status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> AnalysisResponse<T> {
    /// Map a service result into the status envelope
    pub fn from_result(result: Result<Analysis<T>>) -> Self {
        match result {
            Ok(analysis) => Self {
                status: analysis.status,
                snapshot_version: Some(analysis.snapshot_version),
                cache_key: Some(analysis.cache_key),
                data: Some(analysis.data),
                warnings: analysis.warnings,
                error: None,
            },
            Err(err) => Self {
                status: Status::Error,
                snapshot_version: None,
                cache_key: None,
                data: None,
                warnings: Vec::new(),
                error: Some(ErrorBody::from(&err)),
            },
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AnalysisResponse<U> {
        AnalysisResponse {
            status: self.status,
            snapshot_version: self.snapshot_version,
            cache_key: self.cache_key,
            data: self.data.map(f),
            warnings: self.warnings,
            error: self.error,
        }
    }
}
