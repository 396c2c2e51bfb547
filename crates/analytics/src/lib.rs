//! LitGraph analytics engines
//!
//! Four independent engines run against one immutable `GraphStore` snapshot:
//! - `influence`: bounded damped citation-influence propagation
//! - `trends`: bucketed keyword counts, moving averages and growth labels
//! - `collaboration`: co-authorship graph, centrality and communities
//! - `similarity`: multi-factor paper similarity behind an inverted keyword index
//!
//! `report` paginates and merges their outputs; `service` exposes the async
//! call contracts, running each engine on the blocking pool with a deadline.

pub mod collaboration;
pub mod deadline;
pub mod influence;
pub mod outcome;
pub mod report;
pub mod service;
pub mod similarity;
pub mod trends;

pub use deadline::Deadline;
pub use outcome::{Analysis, AnalysisResponse, Outcome, Status, Warning};
pub use service::AnalyticsService;
