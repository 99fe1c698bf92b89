//! Neighbor indices and their cache.
//!
//! A [`NeighborIndex`] is a derived view of one score set. The [`IndexCache`]
//! memoizes indices per `(score_set_id, direction_mode)` and stamps each with
//! the score set version it was built from; a stale stamp is a miss.

mod neighbor;

pub use neighbor::{Neighbor, NeighborIndex};

use crate::models::{DirectionMode, ScoreSet};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Memoized indices keyed by `(score_set_id, direction_mode)`.
#[derive(Debug, Clone, Default)]
pub struct IndexCache {
    entries: BTreeMap<(String, DirectionMode), Arc<NeighborIndex>>,
}

impl IndexCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Returns the cached index for `score_set` when its version still
    /// matches, building and caching a fresh one otherwise.
    pub fn get_or_build(&mut self, score_set: &ScoreSet, mode: DirectionMode) -> Arc<NeighborIndex> {
        let key = (score_set.id.clone(), mode);
        if let Some(index) = self.entries.get(&key)
            && index.source_version() == score_set.version
        {
            metrics::counter!("cogmesh_index_cache_hits_total").increment(1);
            return Arc::clone(index);
        }

        let index = Arc::new(NeighborIndex::build(score_set, mode));
        metrics::counter!("cogmesh_index_builds_total", "mode" => mode.as_str()).increment(1);
        tracing::debug!(
            score_set_id = %score_set.id,
            mode = %mode,
            version = score_set.version,
            "Built neighbor index"
        );
        self.entries.insert(key, Arc::clone(&index));
        index
    }

    /// Drops every cached index of `score_set_id`.
    pub fn invalidate(&mut self, score_set_id: &str) {
        for mode in DirectionMode::all() {
            self.entries.remove(&(score_set_id.to_string(), *mode));
        }
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns `true` when an index for the pair is cached, fresh or not.
    #[must_use]
    pub fn contains(&self, score_set_id: &str, mode: DirectionMode) -> bool {
        self.entries.contains_key(&(score_set_id.to_string(), mode))
    }

    /// Number of cached indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
