//! Score entries and score sets.

use super::cog::CogId;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Directed similarity from one cog to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Source cog.
    pub from_cog_id: CogId,
    /// Target cog.
    pub to_cog_id: CogId,
    /// Similarity in `[0, 1]`.
    pub score: f64,
    /// Diagnostic breakdown of the score.
    #[serde(default)]
    pub vector: BTreeMap<String, f64>,
    /// Spread of the individual feature similarities.
    #[serde(default)]
    pub variance: f64,
    /// Strategy that produced the entry.
    #[serde(default)]
    pub strategy_id: String,
}

/// Pair key of a [`ScoreSet`] entry.
pub type PairKey = (CogId, CogId);

/// The directed similarity matrix of one strategy over a set of cogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    /// Unique identifier.
    pub id: String,
    /// Strategy that produces the entries.
    pub strategy_id: String,
    /// Opaque context tag.
    #[serde(default)]
    pub context_hash: String,
    /// Incremented whenever entries change.
    #[serde(default = "default_version")]
    pub version: u64,
    /// Entries keyed by `(from, to)`; persisted as a list.
    #[serde(
        default,
        serialize_with = "serialize_entries",
        deserialize_with = "deserialize_entries"
    )]
    pub entries: BTreeMap<PairKey, ScoreEntry>,
    /// Member ids when the set was built over an explicit subset. `None` means
    /// the set tracks every known cog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cog_ids: Option<BTreeSet<CogId>>,
}

const fn default_version() -> u64 {
    1
}

impl ScoreSet {
    /// Creates an empty score set tracking every known cog.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        strategy_id: impl Into<String>,
        context_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            strategy_id: strategy_id.into(),
            context_hash: context_hash.into(),
            version: 1,
            entries: BTreeMap::new(),
            cog_ids: None,
        }
    }

    /// Inserts or replaces an entry under its own pair key.
    pub fn insert(&mut self, entry: ScoreEntry) {
        self.entries
            .insert((entry.from_cog_id.clone(), entry.to_cog_id.clone()), entry);
    }

    /// Looks up the entry for `from -> to`.
    #[must_use]
    pub fn get(&self, from: &str, to: &str) -> Option<&ScoreEntry> {
        self.entries.get(&(CogId::new(from), CogId::new(to)))
    }

    /// Returns `true` when the set covers `cog_id`.
    #[must_use]
    pub fn tracks(&self, cog_id: &str) -> bool {
        self.cog_ids.as_ref().is_none_or(|ids| ids.contains(cog_id))
    }

    /// Every id that appears in an entry or in the member list.
    #[must_use]
    pub fn known_ids(&self) -> BTreeSet<CogId> {
        let mut ids: BTreeSet<CogId> = self.cog_ids.clone().unwrap_or_default();
        for (from, to) in self.entries.keys() {
            ids.insert(from.clone());
            ids.insert(to.clone());
        }
        ids
    }
}

fn serialize_entries<S>(
    entries: &BTreeMap<PairKey, ScoreEntry>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(entries.values())
}

fn deserialize_entries<'de, D>(deserializer: D) -> Result<BTreeMap<PairKey, ScoreEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = Vec::<ScoreEntry>::deserialize(deserializer)?;
    Ok(list
        .into_iter()
        .map(|entry| ((entry.from_cog_id.clone(), entry.to_cog_id.clone()), entry))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(from: &str, to: &str, score: f64) -> ScoreEntry {
        ScoreEntry {
            from_cog_id: from.into(),
            to_cog_id: to.into(),
            score,
            vector: BTreeMap::new(),
            variance: 0.0,
            strategy_id: "s".to_string(),
        }
    }

    #[test]
    fn test_entries_serialize_as_list() {
        let mut set = ScoreSet::new("ss", "s", "ctx");
        set.insert(entry("a", "b", 0.5));
        set.insert(entry("b", "a", 0.4));

        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["entries"].as_array().unwrap().len(), 2);
        assert!(value.get("cog_ids").is_none());

        let back: ScoreSet = serde_json::from_value(value).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_tracks_subset() {
        let mut set = ScoreSet::new("ss", "s", "ctx");
        assert!(set.tracks("anything"));
        set.cog_ids = Some([CogId::new("a")].into_iter().collect());
        assert!(set.tracks("a"));
        assert!(!set.tracks("b"));
    }

    #[test]
    fn test_known_ids_include_members_without_entries() {
        let mut set = ScoreSet::new("ss", "s", "ctx");
        set.cog_ids = Some([CogId::new("lonely")].into_iter().collect());
        set.insert(entry("a", "b", 0.1));
        let ids: Vec<_> = set.known_ids().into_iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "lonely"]);
    }
}
