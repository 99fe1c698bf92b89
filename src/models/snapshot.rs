//! Point-in-time copies of orchestrator state.

use super::cog::{Cog, CogId, Component, Metadata};
use super::graph::CogGraph;
use super::lineage::LineageOperation;
use super::score::ScoreSet;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable deep copy of every mutable collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot identifier.
    pub id: String,
    /// Creation time (UTC).
    pub created_at: DateTime<Utc>,
    /// Free-form metadata.
    #[serde(default)]
    pub meta: Metadata,
    /// Cogs keyed by id.
    #[serde(default)]
    pub cogs: BTreeMap<CogId, Cog>,
    /// Components keyed by id.
    #[serde(default)]
    pub components: BTreeMap<String, Component>,
    /// Graphs keyed by id.
    #[serde(default)]
    pub graphs: BTreeMap<String, CogGraph>,
    /// Score sets keyed by id.
    #[serde(default)]
    pub score_sets: BTreeMap<String, ScoreSet>,
    /// Lineage log in append order.
    #[serde(default)]
    pub lineage: Vec<LineageOperation>,
}

impl Snapshot {
    /// Creates an empty snapshot stamped with the current time.
    ///
    /// The timestamp is truncated to microseconds so it survives an RFC 3339
    /// round trip unchanged.
    #[must_use]
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now().trunc_subsecs(6),
            meta: Metadata::new(),
            cogs: BTreeMap::new(),
            components: BTreeMap::new(),
            graphs: BTreeMap::new(),
            score_sets: BTreeMap::new(),
            lineage: Vec::new(),
        }
    }

    /// Entity counts keyed by collection name.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("cogs", self.cogs.len()),
            ("components", self.components.len()),
            ("graphs", self.graphs.len()),
            ("score_sets", self.score_sets.len()),
            ("lineage", self.lineage.len()),
        ])
    }
}
