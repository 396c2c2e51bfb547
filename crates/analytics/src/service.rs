//! Async analytics service
//!
//! Entry point for hosting layers. Each call pins one snapshot, resolves its
//! request against the configured defaults, rejects bad parameters up front
//! and runs the engine on the blocking pool under a `Deadline`. Dropping the
//! returned future cancels the running engine at its next checkpoint.

use crate::collaboration::{
    CollaborationMetrics, CollaborationNetwork, CollaborationParams, WeightCombiner,
};
use crate::deadline::Deadline;
use crate::influence::{InfluenceEngine, InfluenceParams, InfluenceRanking, PropagationMode};
use crate::outcome::{Analysis, AnalysisResponse, Outcome};
use crate::report::{AnalysisReport, PageRequest, ReportAssembler};
use crate::similarity::{
    KeywordIndex, SimilarityEngine, SimilarityParams, SimilarityResult, SimilarityWeights,
};
use crate::trends::{
    BucketSize, TimeWindow, TrendAnalyzer, TrendParams, TrendSeries, TrendThresholds,
};
use litgraph_common::cache::cache_key;
use litgraph_common::config::AnalyticsConfig;
use litgraph_common::errors::{AppError, Result};
use litgraph_common::graph::{
    CitationType, GraphSnapshot, GraphStore, PaperId, SnapshotRegistry, SnapshotSource,
};
use litgraph_common::keywords::{KeywordExtractor, StopwordExtractor};
use litgraph_common::metrics::{record_data_gaps, register_metrics, AnalysisTimer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ptr;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Keyword index together with the snapshot instance it was built from
struct CachedIndex {
    snapshot: Weak<GraphSnapshot>,
    index: Arc<KeywordIndex>,
}

impl CachedIndex {
    fn built_from(&self, snapshot: &Arc<GraphSnapshot>) -> bool {
        ptr::eq(self.snapshot.as_ptr(), Arc::as_ptr(snapshot))
    }
}

/// Keyword indexes by snapshot version
type IndexCache = Arc<RwLock<HashMap<String, CachedIndex>>>;

/// Influence request; unset fields fall back to the configured defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfluenceRequest {
    /// Snapshot version; the current snapshot when unset
    pub snapshot_id: Option<String>,
    pub seeds: Option<Vec<PaperId>>,
    pub decay: Option<f64>,
    pub max_depth: Option<usize>,
    pub epsilon: Option<f64>,
    #[serde(default)]
    pub type_weights: BTreeMap<CitationType, f64>,
    #[serde(default)]
    pub mode: PropagationMode,
    /// Deadline override in milliseconds, 0 disables it
    pub timeout_ms: Option<u64>,
}

/// Trend request for one keyword, or for every keyword when `keyword` is unset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRequest {
    pub snapshot_id: Option<String>,
    pub keyword: Option<String>,
    pub window: TimeWindow,
    pub bucket: BucketSize,
    pub moving_average_windows: Option<Vec<usize>>,
    pub thresholds: Option<TrendThresholds>,
    /// Minimum in-window paper count for keywords in the all-keywords mode
    #[serde(default)]
    pub min_total: u32,
    pub timeout_ms: Option<u64>,
}

impl TrendRequest {
    pub fn keyword(keyword: impl Into<String>, window: TimeWindow, bucket: BucketSize) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Self::all_keywords(window, bucket)
        }
    }

    pub fn all_keywords(window: TimeWindow, bucket: BucketSize) -> Self {
        Self {
            snapshot_id: None,
            keyword: None,
            window,
            bucket,
            moving_average_windows: None,
            thresholds: None,
            min_total: 0,
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollaborationRequest {
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub combiner: WeightCombiner,
    pub max_label_iterations: Option<usize>,
    pub ego_sample_limit: Option<usize>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityRequest {
    pub snapshot_id: Option<String>,
    pub target: PaperId,
    pub top_k: Option<usize>,
    pub candidate_limit: Option<usize>,
    pub weights: Option<SimilarityWeights>,
    pub temporal_tau_days: Option<f64>,
    pub timeout_ms: Option<u64>,
}

impl SimilarityRequest {
    pub fn new(target: PaperId) -> Self {
        Self {
            snapshot_id: None,
            target,
            top_k: None,
            candidate_limit: None,
            weights: None,
            temporal_tau_days: None,
            timeout_ms: None,
        }
    }
}

/// Several analyses over one snapshot, assembled into a paginated report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    pub snapshot_id: Option<String>,
    pub influence: Option<InfluenceRequest>,
    pub trends: Option<TrendRequest>,
    pub collaboration: Option<CollaborationRequest>,
    pub similarity: Option<SimilarityRequest>,
    #[serde(default)]
    pub page: PageRequest,
}

/// Number of result rows, for the results gauge
trait ResultCount {
    fn result_count(&self) -> usize;
}

impl ResultCount for InfluenceRanking {
    fn result_count(&self) -> usize {
        self.scores.len()
    }
}

impl ResultCount for CollaborationMetrics {
    fn result_count(&self) -> usize {
        self.authors.len()
    }
}

impl<T> ResultCount for Vec<T> {
    fn result_count(&self) -> usize {
        self.len()
    }
}

/// Cancels the deadline when the awaiting future goes away
struct CancelOnDrop(Deadline);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Analytics service over a snapshot registry
pub struct AnalyticsService {
    registry: Arc<SnapshotRegistry>,
    extractor: Arc<dyn KeywordExtractor>,
    config: AnalyticsConfig,
    pool: Option<Arc<rayon::ThreadPool>>,
    indexes: IndexCache,
}

impl AnalyticsService {
    /// Build the service; a dedicated rayon pool is created when
    /// `worker_threads` is non-zero, otherwise the global pool is used
    pub fn new(
        registry: Arc<SnapshotRegistry>,
        extractor: Arc<dyn KeywordExtractor>,
        config: AnalyticsConfig,
    ) -> Result<Self> {
        let pool = match config.worker_threads {
            0 => None,
            threads => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("litgraph-analytics-{}", i))
                    .build()
                    .map_err(|e| AppError::Configuration {
                        message: format!("failed to build analytics thread pool: {}", e),
                    })?;
                Some(Arc::new(pool))
            }
        };

        register_metrics();
        info!(
            worker_threads = config.worker_threads,
            request_timeout_ms = config.request_timeout_ms,
            "Analytics service initialized"
        );

        Ok(Self {
            registry,
            extractor,
            config,
            pool,
            indexes: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Service with the stop-word keyword extractor
    pub fn with_defaults(registry: Arc<SnapshotRegistry>, config: AnalyticsConfig) -> Result<Self> {
        Self::new(registry, Arc::new(StopwordExtractor::default()), config)
    }

    pub fn registry(&self) -> &Arc<SnapshotRegistry> {
        &self.registry
    }

    /// Load and publish a fresh snapshot, dropping indexes of evicted versions
    #[instrument(skip(self, source))]
    pub async fn refresh(&self, source: &dyn SnapshotSource) -> Result<String> {
        let snapshot = self.registry.refresh(source).await?;
        let retained = self.registry.versions();
        self.indexes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|version, cached| {
                retained.contains(version) && cached.snapshot.strong_count() > 0
            });
        Ok(snapshot.snapshot_version().to_string())
    }

    /// Ranked citation influence
    #[instrument(skip(self, request), fields(snapshot = ?request.snapshot_id))]
    pub async fn compute_influence(
        &self,
        request: InfluenceRequest,
    ) -> Result<Analysis<InfluenceRanking>> {
        let defaults = &self.config.influence;
        let params = InfluenceParams {
            decay: request.decay.unwrap_or(defaults.decay),
            max_depth: request.max_depth.unwrap_or(defaults.max_depth),
            epsilon: request.epsilon.unwrap_or(defaults.epsilon),
            seeds: request.seeds,
            type_weights: request.type_weights,
            mode: request.mode,
        };
        params.check()?;

        let snapshot = self.snapshot(request.snapshot_id.as_deref())?;
        let key = cache_key("influence", snapshot.snapshot_version(), &params)?;

        self.run("influence", snapshot, key, request.timeout_ms, move |store, deadline| {
            InfluenceEngine::new(store).compute(&params, deadline)
        })
        .await
    }

    /// Keyword trend series
    #[instrument(
        skip(self, request),
        fields(snapshot = ?request.snapshot_id, keyword = ?request.keyword)
    )]
    pub async fn compute_trends(
        &self,
        request: TrendRequest,
    ) -> Result<Analysis<Vec<TrendSeries>>> {
        let defaults = &self.config.trends;
        let params = TrendParams {
            window: request.window,
            bucket: request.bucket,
            moving_average_windows: request
                .moving_average_windows
                .unwrap_or_else(|| defaults.moving_average_windows.clone()),
            thresholds: request.thresholds.unwrap_or(TrendThresholds {
                growth_high: defaults.growth_high,
                sustained_periods: defaults.sustained_periods,
                emerging_baseline: defaults.emerging_baseline,
            }),
        };
        params.check()?;

        let snapshot = self.snapshot(request.snapshot_id.as_deref())?;
        let key = cache_key(
            "trends",
            snapshot.snapshot_version(),
            &(&request.keyword, &params, request.min_total),
        )?;

        let extractor = Arc::clone(&self.extractor);
        let keyword = request.keyword;
        let min_total = request.min_total;
        self.run("trends", snapshot, key, request.timeout_ms, move |store, deadline| {
            let analyzer = TrendAnalyzer::new(store, extractor.as_ref());
            match keyword {
                Some(keyword) => Ok(analyzer
                    .analyze(&keyword, &params, deadline)?
                    .map(|series| vec![series])),
                None => analyzer.analyze_all(&params, min_total, deadline),
            }
        })
        .await
    }

    /// Per-author collaboration metrics and communities
    #[instrument(skip(self, request), fields(snapshot = ?request.snapshot_id))]
    pub async fn compute_collaboration_metrics(
        &self,
        request: CollaborationRequest,
    ) -> Result<Analysis<CollaborationMetrics>> {
        let defaults = &self.config.collaboration;
        let params = CollaborationParams {
            combiner: request.combiner,
            max_label_iterations: request
                .max_label_iterations
                .unwrap_or(defaults.max_label_iterations),
            ego_sample_limit: request.ego_sample_limit.unwrap_or(defaults.ego_sample_limit),
        };
        validator::Validate::validate(&params)?;

        let snapshot = self.snapshot(request.snapshot_id.as_deref())?;
        let key = cache_key("collaboration", snapshot.snapshot_version(), &params)?;

        self.run("collaboration", snapshot, key, request.timeout_ms, move |store, deadline| {
            CollaborationNetwork::new(store).compute(&params, deadline)
        })
        .await
    }

    /// Papers most similar to the target
    #[instrument(
        skip(self, request),
        fields(snapshot = ?request.snapshot_id, target = %request.target)
    )]
    pub async fn compute_similarity(
        &self,
        request: SimilarityRequest,
    ) -> Result<Analysis<Vec<SimilarityResult>>> {
        let defaults = &self.config.similarity;
        let params = SimilarityParams {
            top_k: request.top_k.unwrap_or(defaults.top_k),
            candidate_limit: request.candidate_limit.unwrap_or(defaults.candidate_limit),
            temporal_tau_days: request.temporal_tau_days.unwrap_or(defaults.temporal_tau_days),
            weights: request.weights.unwrap_or(SimilarityWeights {
                title: defaults.title_weight,
                abstract_text: defaults.abstract_weight,
                temporal: defaults.temporal_weight,
                citation: defaults.citation_weight,
                author: defaults.author_weight,
            }),
        };
        params.check()?;

        let snapshot = self.snapshot(request.snapshot_id.as_deref())?;
        let key = cache_key("similarity", snapshot.snapshot_version(), &(request.target, &params))?;

        let extractor = Arc::clone(&self.extractor);
        let indexes = Arc::clone(&self.indexes);
        let target = request.target;
        let pinned = Arc::clone(&snapshot);
        self.run("similarity", snapshot, key, request.timeout_ms, move |store, deadline| {
            let index = keyword_index(&indexes, &pinned, extractor.as_ref());
            SimilarityEngine::new(store, &index, extractor.as_ref())
                .find_similar(target, &params, deadline)
        })
        .await
    }

    /// Run the requested analyses concurrently against one snapshot.
    ///
    /// A failing section is reported inside the report; only an unknown
    /// snapshot fails the whole call.
    #[instrument(skip(self, request), fields(snapshot = ?request.snapshot_id))]
    pub async fn build_report(&self, request: ReportRequest) -> Result<AnalysisReport> {
        let snapshot = self.snapshot(request.snapshot_id.as_deref())?;
        let version = Some(snapshot.snapshot_version().to_string());
        let pin = |id: &mut Option<String>| *id = version.clone();

        let influence = request.influence.map(|mut r| {
            pin(&mut r.snapshot_id);
            r
        });
        let trends = request.trends.map(|mut r| {
            pin(&mut r.snapshot_id);
            r
        });
        let collaboration = request.collaboration.map(|mut r| {
            pin(&mut r.snapshot_id);
            r
        });
        let similarity = request.similarity.map(|mut r| {
            pin(&mut r.snapshot_id);
            r
        });

        let (influence, trends, collaboration, similarity) = futures::join!(
            async {
                match influence {
                    Some(r) => Some(self.compute_influence(r).await),
                    None => None,
                }
            },
            async {
                match trends {
                    Some(r) => Some(self.compute_trends(r).await),
                    None => None,
                }
            },
            async {
                match collaboration {
                    Some(r) => Some(self.compute_collaboration_metrics(r).await),
                    None => None,
                }
            },
            async {
                match similarity {
                    Some(r) => Some(self.compute_similarity(r).await),
                    None => None,
                }
            },
        );

        let mut assembler = ReportAssembler::new(request.page);
        if let Some(result) = influence {
            let response = AnalysisResponse::from_result(result).map(|ranking| ranking.scores);
            assembler = assembler.influence(response);
        }
        if let Some(result) = trends {
            assembler = assembler.trends(AnalysisResponse::from_result(result));
        }
        if let Some(result) = collaboration {
            let response = AnalysisResponse::from_result(result).map(|metrics| metrics.authors);
            assembler = assembler.collaboration(response);
        }
        if let Some(result) = similarity {
            assembler = assembler.similarity(AnalysisResponse::from_result(result));
        }

        let report = assembler.assemble();
        info!(status = report.status.as_str(), "Report assembled");
        Ok(report)
    }

    fn snapshot(&self, snapshot_id: Option<&str>) -> Result<Arc<GraphSnapshot>> {
        match snapshot_id {
            Some(version) => self.registry.get(version),
            None => self.registry.current(),
        }
    }

    fn deadline(&self, timeout_ms: Option<u64>) -> Deadline {
        let timeout = match timeout_ms {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => self.config.request_timeout(),
        };
        Deadline::from_timeout(timeout)
    }

    /// Run `job` on the blocking pool and wrap its outcome
    async fn run<T, F>(
        &self,
        engine: &'static str,
        snapshot: Arc<GraphSnapshot>,
        cache_key: String,
        timeout_ms: Option<u64>,
        job: F,
    ) -> Result<Analysis<T>>
    where
        T: ResultCount + Send + 'static,
        F: FnOnce(&dyn GraphStore, &Deadline) -> Result<Outcome<T>> + Send + 'static,
    {
        let timer = AnalysisTimer::start(engine);
        let deadline = self.deadline(timeout_ms);
        let guard = CancelOnDrop(deadline.clone());
        let pool = self.pool.clone();
        let version = snapshot.snapshot_version().to_string();

        let result = tokio::task::spawn_blocking(move || {
            let store: &dyn GraphStore = &*snapshot;
            match pool {
                Some(pool) => pool.install(|| job(store, &deadline)),
                None => job(store, &deadline),
            }
        })
        .await;
        drop(guard);

        let outcome = match result.map_err(AppError::from).and_then(|r| r) {
            Ok(outcome) => outcome,
            Err(err) => {
                if err.is_caller_error() {
                    warn!(engine, error = %err, "Analysis rejected");
                } else {
                    error!(engine, error = %err, "Analysis failed");
                }
                timer.finish("error", 0);
                return Err(err);
            }
        };

        let elapsed_ms = (timer.elapsed_secs() * 1000.0) as u64;
        let status = outcome.status();
        record_data_gaps(engine, outcome.data_gaps());
        timer.finish(status.as_str(), outcome.data.result_count());
        debug!(engine, status = status.as_str(), elapsed_ms, "Analysis finished");

        Ok(Analysis::from_outcome(outcome, version, cache_key, elapsed_ms))
    }
}

/// Index for `snapshot`, built once per snapshot instance.
///
/// A version republished with different content gets a fresh index, and
/// entries whose snapshot has been dropped are pruned on insert.
fn keyword_index(
    cache: &RwLock<HashMap<String, CachedIndex>>,
    snapshot: &Arc<GraphSnapshot>,
    extractor: &dyn KeywordExtractor,
) -> Arc<KeywordIndex> {
    let version = snapshot.snapshot_version();
    if let Some(cached) = cache.read().unwrap_or_else(PoisonError::into_inner).get(version) {
        if cached.built_from(snapshot) {
            return Arc::clone(&cached.index);
        }
    }

    let store: &dyn GraphStore = &**snapshot;
    let index = Arc::new(KeywordIndex::build(store, extractor));
    let mut cache = cache.write().unwrap_or_else(PoisonError::into_inner);
    cache.retain(|_, cached| cached.snapshot.strong_count() > 0);
    if let Some(cached) = cache.get(version) {
        if cached.built_from(snapshot) {
            return Arc::clone(&cached.index);
        }
    }
    debug!(version, keywords = index.keyword_count(), "Keyword index built");
    cache.insert(
        version.to_string(),
        CachedIndex {
            snapshot: Arc::downgrade(snapshot),
            index: Arc::clone(&index),
        },
    );
    index
}
