//! Configuration management for LitGraph
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values
//!
//! Every calibration constant the analytics engines use lives here, so a
//! deployment can tune thresholds without code changes.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Analytics engine defaults
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or env-filter directive (debug, info, litgraph_analytics=trace, ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name attached to log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

/// Defaults and limits shared by all analytics engines
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    /// Per-request deadline in milliseconds (0 disables the deadline)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Worker threads for parallel sub-computations (0 = rayon default)
    #[serde(default)]
    pub worker_threads: usize,

    #[serde(default)]
    pub influence: InfluenceDefaults,

    #[serde(default)]
    pub trends: TrendDefaults,

    #[serde(default)]
    pub collaboration: CollaborationDefaults,

    #[serde(default)]
    pub similarity: SimilarityDefaults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InfluenceDefaults {
    /// Per-hop decay factor, in (0, 1]
    #[serde(default = "default_decay")]
    pub decay: f64,

    /// Maximum propagation depth
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Convergence threshold on the largest per-paper delta
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrendDefaults {
    /// Moving-average window sizes, in buckets
    #[serde(default = "default_ma_windows")]
    pub moving_average_windows: Vec<usize>,

    /// Growth rate above which a keyword can be classified emerging
    #[serde(default = "default_growth_high")]
    pub growth_high: f64,

    /// Consecutive buckets of same-sign growth needed for growing/declining
    #[serde(default = "default_sustained_periods")]
    pub sustained_periods: usize,

    /// Trailing average below which a keyword counts as previously rare
    #[serde(default = "default_emerging_baseline")]
    pub emerging_baseline: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollaborationDefaults {
    /// Label propagation iteration cap
    #[serde(default = "default_max_label_iterations")]
    pub max_label_iterations: usize,

    /// Maximum neighbors sampled per ego network
    #[serde(default = "default_ego_sample_limit")]
    pub ego_sample_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimilarityDefaults {
    #[serde(default = "default_title_weight")]
    pub title_weight: f64,

    #[serde(default = "default_abstract_weight")]
    pub abstract_weight: f64,

    #[serde(default = "default_temporal_weight")]
    pub temporal_weight: f64,

    #[serde(default = "default_citation_weight")]
    pub citation_weight: f64,

    #[serde(default = "default_author_weight")]
    pub author_weight: f64,

    /// Temporal decay constant in days
    #[serde(default = "default_temporal_tau_days")]
    pub temporal_tau_days: f64,

    /// Candidate pool size limit
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    /// Default number of results
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

// Default value functions
fn default_database_url() -> String { "postgres://localhost/litgraph".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "litgraph".to_string() }
fn default_request_timeout_ms() -> u64 { 30_000 }
fn default_decay() -> f64 { 0.5 }
fn default_max_depth() -> usize { 5 }
fn default_epsilon() -> f64 { 1e-6 }
fn default_ma_windows() -> Vec<usize> { vec![3, 6] }
fn default_growth_high() -> f64 { 0.5 }
fn default_sustained_periods() -> usize { 2 }
fn default_emerging_baseline() -> f64 { 5.0 }
fn default_max_label_iterations() -> usize { 20 }
fn default_ego_sample_limit() -> usize { 64 }
fn default_title_weight() -> f64 { 0.25 }
fn default_abstract_weight() -> f64 { 0.25 }
fn default_temporal_weight() -> f64 { 0.10 }
fn default_citation_weight() -> f64 { 0.25 }
fn default_author_weight() -> f64 { 0.15 }
fn default_temporal_tau_days() -> f64 { 730.0 }
fn default_candidate_limit() -> usize { 500 }
fn default_top_k() -> usize { 20 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            read_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            worker_threads: 0,
            influence: InfluenceDefaults::default(),
            trends: TrendDefaults::default(),
            collaboration: CollaborationDefaults::default(),
            similarity: SimilarityDefaults::default(),
        }
    }
}

impl Default for InfluenceDefaults {
    fn default() -> Self {
        Self {
            decay: default_decay(),
            max_depth: default_max_depth(),
            epsilon: default_epsilon(),
        }
    }
}

impl Default for TrendDefaults {
    fn default() -> Self {
        Self {
            moving_average_windows: default_ma_windows(),
            growth_high: default_growth_high(),
            sustained_periods: default_sustained_periods(),
            emerging_baseline: default_emerging_baseline(),
        }
    }
}

impl Default for CollaborationDefaults {
    fn default() -> Self {
        Self {
            max_label_iterations: default_max_label_iterations(),
            ego_sample_limit: default_ego_sample_limit(),
        }
    }
}

impl Default for SimilarityDefaults {
    fn default() -> Self {
        Self {
            title_weight: default_title_weight(),
            abstract_weight: default_abstract_weight(),
            temporal_weight: default_temporal_weight(),
            citation_weight: default_citation_weight(),
            author_weight: default_author_weight(),
            temporal_tau_days: default_temporal_tau_days(),
            candidate_limit: default_candidate_limit(),
            top_k: default_top_k(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            observability: ObservabilityConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, config files and the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__ANALYTICS__INFLUENCE__DECAY=0.7
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl AnalyticsConfig {
    /// Per-request deadline, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
