//! Snapshot registry
//!
//! Holds published snapshots by version. Requests grab an `Arc` to the
//! current snapshot once at start; publishing a new one never disturbs
//! analyses already running against an older version.

use super::{GraphSnapshot, GraphStore, SnapshotSource};
use crate::errors::{AppError, Result};
use crate::metrics;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Number of versions kept addressable by default
const DEFAULT_RETAINED_VERSIONS: usize = 4;

#[derive(Default)]
struct RegistryState {
    current: Option<Arc<GraphSnapshot>>,
    by_version: HashMap<String, Arc<GraphSnapshot>>,
    order: VecDeque<String>,
}

/// Registry of immutable snapshots
pub struct SnapshotRegistry {
    state: RwLock<RegistryState>,
    retain: usize,
}

impl SnapshotRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETAINED_VERSIONS)
    }

    /// Create a registry keeping the last `retain` versions addressable
    pub fn with_retention(retain: usize) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            retain: retain.max(1),
        }
    }

    /// Publish a snapshot and make it current
    pub fn publish(&self, snapshot: GraphSnapshot) -> Arc<GraphSnapshot> {
        let snapshot = Arc::new(snapshot);
        let version = snapshot.snapshot_version().to_string();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.by_version.insert(version.clone(), snapshot.clone()).is_none() {
            state.order.push_back(version.clone());
        }
        while state.order.len() > self.retain {
            if let Some(evicted) = state.order.pop_front() {
                state.by_version.remove(&evicted);
            }
        }
        state.current = Some(snapshot.clone());
        drop(state);

        metrics::record_snapshot(snapshot.paper_count(), snapshot.citation_count());
        info!(
            version = %version,
            papers = snapshot.paper_count(),
            citations = snapshot.citation_count(),
            authors = snapshot.author_count(),
            "Snapshot published"
        );
        snapshot
    }

    /// Load a snapshot from `source` and publish it
    pub async fn refresh(&self, source: &dyn SnapshotSource) -> Result<Arc<GraphSnapshot>> {
        let snapshot = source.load_snapshot().await?;
        Ok(self.publish(snapshot))
    }

    /// The current snapshot
    pub fn current(&self) -> Result<Arc<GraphSnapshot>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.current.clone().ok_or_else(|| AppError::SnapshotNotFound {
            version: "current".to_string(),
        })
    }

    /// A specific retained snapshot
    pub fn get(&self, version: &str) -> Result<Arc<GraphSnapshot>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .by_version
            .get(version)
            .cloned()
            .ok_or_else(|| AppError::SnapshotNotFound {
                version: version.to_string(),
            })
    }

    /// Retained versions, oldest first
    pub fn versions(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.order.iter().cloned().collect()
    }
}

impl Default for SnapshotRegistry {
    fn default() -> Self {
        Self::new()
    }
}
