//! LitGraph Common Library
//!
//! Shared code for the LitGraph analytics engines including:
//! - The literature graph snapshot and its read-only store contract
//! - Database models and the snapshot loader
//! - Keyword extraction
//! - Error types and handling
//! - Configuration management
//! - Metrics, tracing and cache keys

pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod graph;
pub mod keywords;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, ErrorCode, Result};
pub use graph::{
    Author, AuthorId, Authorship, CitationEdge, CitationType, GraphSnapshot, GraphStore, Paper,
    PaperId, SnapshotBuilder, SnapshotRegistry, SnapshotSource,
};
pub use keywords::{KeywordExtractor, StopwordExtractor};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
