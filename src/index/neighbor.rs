//! Sorted neighbor lists built from a score set.

use crate::models::{CogId, DirectionMode, ScoreSet};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// One ranked neighbor of a cog.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// The neighbor.
    pub to_cog_id: CogId,
    /// Similarity to the neighbor.
    pub score: f64,
    /// Feature spread of the underlying entry.
    pub variance: f64,
    /// Strategy that produced the entry.
    pub strategy_id: String,
}

/// Canonical order: score descending, variance ascending, id ascending.
fn canonical(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.variance.total_cmp(&b.variance))
        .then_with(|| a.to_cog_id.cmp(&b.to_cog_id))
}

/// Read-only neighbor rankings for one `(score set, direction mode)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborIndex {
    score_set_id: String,
    direction_mode: DirectionMode,
    source_version: u64,
    by_from: BTreeMap<CogId, Vec<Neighbor>>,
}

impl NeighborIndex {
    /// Builds the index for `score_set` under `direction_mode`.
    #[must_use]
    pub fn build(score_set: &ScoreSet, direction_mode: DirectionMode) -> Self {
        let mut by_from = match direction_mode {
            DirectionMode::Directed => Self::directed(score_set),
            DirectionMode::Symmetrized => Self::symmetrized(score_set),
        };
        for neighbors in by_from.values_mut() {
            neighbors.sort_by(canonical);
        }
        Self {
            score_set_id: score_set.id.clone(),
            direction_mode,
            source_version: score_set.version,
            by_from,
        }
    }

    fn directed(score_set: &ScoreSet) -> BTreeMap<CogId, Vec<Neighbor>> {
        let mut by_from: BTreeMap<CogId, Vec<Neighbor>> = BTreeMap::new();
        for entry in score_set.entries.values() {
            by_from
                .entry(entry.from_cog_id.clone())
                .or_default()
                .push(Neighbor {
                    to_cog_id: entry.to_cog_id.clone(),
                    score: entry.score,
                    variance: entry.variance,
                    strategy_id: entry.strategy_id.clone(),
                });
        }
        by_from
    }

    fn symmetrized(score_set: &ScoreSet) -> BTreeMap<CogId, Vec<Neighbor>> {
        // (score sum, variance sum, contributing directions, strategy)
        let mut pairs: BTreeMap<(CogId, CogId), (f64, f64, u8, String)> = BTreeMap::new();
        for entry in score_set.entries.values() {
            if entry.from_cog_id == entry.to_cog_id {
                continue;
            }
            let key = if entry.from_cog_id < entry.to_cog_id {
                (entry.from_cog_id.clone(), entry.to_cog_id.clone())
            } else {
                (entry.to_cog_id.clone(), entry.from_cog_id.clone())
            };
            let slot = pairs
                .entry(key)
                .or_insert_with(|| (0.0, 0.0, 0, entry.strategy_id.clone()));
            slot.0 += entry.score;
            slot.1 += entry.variance;
            slot.2 += 1;
        }

        let mut by_from: BTreeMap<CogId, Vec<Neighbor>> = score_set
            .known_ids()
            .into_iter()
            .map(|id| (id, Vec::new()))
            .collect();
        for ((left, right), (score_sum, variance_sum, count, strategy_id)) in pairs {
            let n = f64::from(count);
            let score = score_sum / n;
            let variance = variance_sum / n;
            by_from.entry(left.clone()).or_default().push(Neighbor {
                to_cog_id: right.clone(),
                score,
                variance,
                strategy_id: strategy_id.clone(),
            });
            by_from.entry(right).or_default().push(Neighbor {
                to_cog_id: left,
                score,
                variance,
                strategy_id,
            });
        }
        by_from
    }

    /// Source score set id.
    #[must_use]
    pub fn score_set_id(&self) -> &str {
        &self.score_set_id
    }

    /// Aggregation mode.
    #[must_use]
    pub const fn direction_mode(&self) -> DirectionMode {
        self.direction_mode
    }

    /// Version of the score set the index was built from.
    #[must_use]
    pub const fn source_version(&self) -> u64 {
        self.source_version
    }

    /// Ids with a neighbor list.
    pub fn ids(&self) -> impl Iterator<Item = &CogId> {
        self.by_from.keys()
    }

    /// A copy of the sorted neighbor list of `from`; empty when unknown.
    #[must_use]
    pub fn neighbors(&self, from: &str) -> Vec<Neighbor> {
        self.by_from.get(from).cloned().unwrap_or_default()
    }

    /// The score of `from -> to` as seen by this index.
    #[must_use]
    pub fn score(&self, from: &str, to: &str) -> Option<f64> {
        self.by_from
            .get(from)?
            .iter()
            .find(|n| n.to_cog_id.as_str() == to)
            .map(|n| n.score)
    }

    fn qualifying<'a>(
        &'a self,
        from: &str,
        seen: &'a BTreeSet<CogId>,
        min_score: Option<f64>,
        allowed: Option<&'a BTreeSet<CogId>>,
    ) -> impl Iterator<Item = &'a Neighbor> {
        self.by_from
            .get(from)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(move |n| !seen.contains(&n.to_cog_id))
            .filter(move |n| allowed.is_none_or(|a| a.contains(&n.to_cog_id)))
            .filter(move |n| min_score.is_none_or(|min| n.score >= min))
    }

    /// The best neighbor of `from` that is unseen, allowed, and scores at
    /// least `min_score`.
    #[must_use]
    pub fn top_unseen(
        &self,
        from: &str,
        seen: &BTreeSet<CogId>,
        min_score: Option<f64>,
        allowed: Option<&BTreeSet<CogId>>,
    ) -> Option<Neighbor> {
        self.qualifying(from, seen, min_score, allowed).next().cloned()
    }

    /// The leading run of qualifying neighbors whose scores lie within
    /// `max_range` of the first one. The scan stops at the first qualifying
    /// neighbor outside the range.
    #[must_use]
    pub fn range_group(
        &self,
        from: &str,
        max_range: f64,
        seen: &BTreeSet<CogId>,
        min_score: Option<f64>,
        allowed: Option<&BTreeSet<CogId>>,
    ) -> Vec<Neighbor> {
        let mut qualifying = self.qualifying(from, seen, min_score, allowed).peekable();
        let Some(baseline) = qualifying.peek().map(|n| n.score) else {
            return Vec::new();
        };
        qualifying
            .take_while(|n| (baseline - n.score).abs() <= max_range)
            .cloned()
            .collect()
    }
}
