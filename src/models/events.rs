//! Cascade events and the per-call report.

use super::cog::CogId;
use serde::Serialize;

/// Events emitted while a mutation cascades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CascadeEvent {
    /// A cog was created or mutated and its features recomputed.
    CogUpdated {
        /// The updated cog.
        cog_id: CogId,
        /// Its version after the mutation.
        version: u64,
    },
    /// A score set was rescored because of a cog update.
    ScoresUpdated {
        /// The rescored score set.
        score_set_id: String,
        /// The cog whose update triggered the rescoring.
        source_cog_id: CogId,
    },
}

impl CascadeEvent {
    /// Returns the event topic, as used in logs.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::CogUpdated { .. } => "cog.updated",
            Self::ScoresUpdated { .. } => "scores.updated",
        }
    }
}

/// Work performed by one synchronous cascade.
///
/// Each rescored score set costs `2 * (members - 1)` strategy calls, and each
/// bound graph a full bucket reorder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Events in emission order.
    pub events: Vec<CascadeEvent>,
    /// Score sets rescored, in order.
    pub score_sets_rescored: Vec<String>,
    /// Directed pairs recomputed across all score sets.
    pub pairs_rescored: usize,
    /// Graphs reordered, in order.
    pub graphs_reordered: Vec<String>,
    /// Bound graphs whose reorder failed, with the error message.
    pub graphs_skipped: Vec<(String, String)>,
}

impl CascadeReport {
    /// Returns `true` when nothing beyond the triggering update happened.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.score_sets_rescored.is_empty()
            && self.graphs_reordered.is_empty()
            && self.graphs_skipped.is_empty()
    }
}
