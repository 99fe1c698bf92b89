//! The cog system orchestrator.
//!
//! [`CogSystem`] owns every collection and runs the cascade. A cog mutation
//! flows through typed calls:
//!
//! ```text
//! add_cog / update_cog
//!   -> on_cog_updated      (one CogUpdated event)
//!        -> rescore        (per tracking score set: 2 * (members - 1) strategy calls)
//!        -> on_scores_updated (one ScoresUpdated event per score set)
//!             -> reorder_graph (per graph bound to that score set)
//! ```
//!
//! Nothing calls back into `on_cog_updated`, so the cascade terminates. Its
//! cost grows with cogs times score sets plus bound graphs and is reported in
//! the returned [`CascadeReport`].

use crate::index::{IndexCache, NeighborIndex};
use crate::models::{
    CORE_NAMESPACE, CascadeEvent, CascadeReport, Cog, CogGraph, CogId, Component,
    DERIVED_FEATURE_KEYS, DirectionMode, LineageOperation, Metadata, NamespacedValues, PathPolicy,
    ScoreSet, Snapshot, TechniqueBindings,
};
use crate::scoring::{
    PluginCatalog, SharedStrategy, SharedTechnique, SimilarityStrategy, build_from_preset,
    default_word_techniques, list_presets,
};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Cog fields `update_cog` may write.
pub const WRITABLE_COG_FIELDS: &[&str] = &[
    "theme",
    "breadth",
    "depth",
    "volume",
    "content",
    "component_ids",
    "features",
    "metadata",
    "scoring",
];

/// Cog fields that exist but cannot be written.
const READ_ONLY_COG_FIELDS: &[&str] = &["id", "version"];

/// Owner of all cogs, graphs, score sets, registries and the lineage log.
#[derive(Default)]
pub struct CogSystem {
    pub(crate) components: BTreeMap<String, Component>,
    pub(crate) cogs: BTreeMap<CogId, Cog>,
    pub(crate) graphs: BTreeMap<String, CogGraph>,
    pub(crate) score_sets: BTreeMap<String, ScoreSet>,
    strategies: BTreeMap<String, SharedStrategy>,
    techniques: BTreeMap<String, SharedTechnique>,
    default_techniques: TechniqueBindings,
    pub(crate) graph_policies: BTreeMap<String, PathPolicy>,
    pub(crate) index_cache: IndexCache,
    pub(crate) lineage: Vec<LineageOperation>,
    plugins: PluginCatalog,
}

impl fmt::Debug for CogSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CogSystem")
            .field("cogs", &self.cogs.len())
            .field("components", &self.components.len())
            .field("graphs", &self.graphs.len())
            .field("score_sets", &self.score_sets.len())
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .field("techniques", &self.techniques.keys().collect::<Vec<_>>())
            .field("lineage", &self.lineage.len())
            .finish_non_exhaustive()
    }
}

impl CogSystem {
    /// Creates an empty system with the built-in plugin catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ----- registries -------------------------------------------------------

    /// Registers or replaces a strategy under its id.
    pub fn register_strategy(&mut self, strategy: SharedStrategy) {
        tracing::debug!(strategy_id = strategy.id(), "Registered strategy");
        self.strategies.insert(strategy.id().to_string(), strategy);
    }

    /// Preset id to description.
    #[must_use]
    pub fn available_strategy_presets(&self) -> BTreeMap<String, String> {
        list_presets()
    }

    /// Builds a weighted strategy from a preset and registers it.
    ///
    /// Returns the registered strategy id.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown preset or rejected overrides.
    pub fn register_weighted_strategy_preset(
        &mut self,
        preset_id: &str,
        strategy_id: Option<&str>,
        overrides: Option<&Metadata>,
    ) -> Result<String> {
        let strategy = build_from_preset(preset_id, strategy_id, overrides)?;
        let id = strategy.id.clone();
        self.register_strategy(Arc::new(strategy));
        Ok(id)
    }

    /// Registers a technique; with `use_as_default` every cog gets it bound to
    /// its `namespace.feature_name` unless the cog binds that feature itself.
    pub fn register_feature_technique(&mut self, technique: SharedTechnique, use_as_default: bool) {
        if use_as_default {
            self.default_techniques
                .entry(technique.namespace().to_string())
                .or_default()
                .insert(technique.feature_name().to_string(), technique.id().to_string());
        }
        self.techniques.insert(technique.id().to_string(), technique);
    }

    /// Registers the core word techniques as defaults.
    pub fn register_default_word_feature_techniques(&mut self) {
        for technique in default_word_techniques() {
            self.register_feature_technique(technique, true);
        }
    }

    /// Registers every technique of a catalog bundle.
    ///
    /// Returns the registered technique ids.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown bundle.
    pub fn register_feature_plugin(&mut self, name: &str, use_as_default: bool) -> Result<Vec<String>> {
        let techniques = self.plugins.load(name)?;
        let ids = techniques.iter().map(|t| t.id().to_string()).collect();
        for technique in techniques {
            self.register_feature_technique(technique, use_as_default);
        }
        tracing::info!(plugin = name, use_as_default, "Registered feature plugin");
        Ok(ids)
    }

    /// The plugin catalog, for registering custom bundles.
    pub const fn plugins_mut(&mut self) -> &mut PluginCatalog {
        &mut self.plugins
    }

    // ----- accessors --------------------------------------------------------

    /// Looks up a cog.
    #[must_use]
    pub fn cog(&self, cog_id: &str) -> Option<&Cog> {
        self.cogs.get(cog_id)
    }

    /// Every cog, ordered by id.
    pub fn cogs(&self) -> impl Iterator<Item = &Cog> {
        self.cogs.values()
    }

    /// Looks up a component.
    #[must_use]
    pub fn component(&self, component_id: &str) -> Option<&Component> {
        self.components.get(component_id)
    }

    /// Looks up a graph.
    #[must_use]
    pub fn graph(&self, graph_id: &str) -> Option<&CogGraph> {
        self.graphs.get(graph_id)
    }

    /// Looks up a score set.
    #[must_use]
    pub fn score_set(&self, score_set_id: &str) -> Option<&ScoreSet> {
        self.score_sets.get(score_set_id)
    }

    /// The policy bound to a graph.
    #[must_use]
    pub fn graph_policy(&self, graph_id: &str) -> Option<&PathPolicy> {
        self.graph_policies.get(graph_id)
    }

    /// The lineage log in append order.
    #[must_use]
    pub fn lineage(&self) -> &[LineageOperation] {
        &self.lineage
    }

    /// Returns `true` when a strategy with this id is registered.
    #[must_use]
    pub fn has_strategy(&self, strategy_id: &str) -> bool {
        self.strategies.contains_key(strategy_id)
    }

    /// Returns `true` when a cached index exists for the pair.
    #[must_use]
    pub fn has_cached_index(&self, score_set_id: &str, mode: DirectionMode) -> bool {
        self.index_cache.contains(score_set_id, mode)
    }

    /// Entity counts keyed by collection name.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("cogs", self.cogs.len()),
            ("components", self.components.len()),
            ("graphs", self.graphs.len()),
            ("score_sets", self.score_sets.len()),
            ("strategies", self.strategies.len()),
            ("feature_techniques", self.techniques.len()),
        ])
    }

    pub(crate) fn require_cog(&self, cog_id: &str) -> Result<&Cog> {
        self.cogs.get(cog_id).ok_or_else(|| Error::unknown("cog", cog_id))
    }

    pub(crate) fn require_graph(&self, graph_id: &str) -> Result<&CogGraph> {
        self.graphs
            .get(graph_id)
            .ok_or_else(|| Error::unknown("graph", graph_id))
    }

    fn require_strategy(&self, strategy_id: &str) -> Result<SharedStrategy> {
        self.strategies
            .get(strategy_id)
            .map(Arc::clone)
            .ok_or_else(|| Error::unknown("strategy", strategy_id))
    }

    // ----- features ---------------------------------------------------------

    /// Recomputes the derived features of `cog` in place.
    ///
    /// Default technique bindings are merged under the cog's own bindings,
    /// previous derived keys are removed from `features`, and every bound
    /// technique is evaluated. Core values are also written to the flat
    /// `breadth`/`depth`/`volume` keys and fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] when a bound technique is not
    /// registered; `cog` is left untouched in that case.
    pub fn recompute_features(&self, cog: &mut Cog) -> Result<()> {
        let mut bindings = cog.scoring.feature_techniques.clone();
        for (namespace, defaults) in &self.default_techniques {
            let bound = bindings.entry(namespace.clone()).or_default();
            for (feature_name, technique_id) in defaults {
                bound
                    .entry(feature_name.clone())
                    .or_insert_with(|| technique_id.clone());
            }
        }

        let mut resolved = Vec::new();
        for (namespace, features) in &bindings {
            for (feature_name, technique_id) in features {
                let technique = self
                    .techniques
                    .get(technique_id)
                    .ok_or_else(|| Error::unknown("feature technique", technique_id))?;
                resolved.push((namespace, feature_name, Arc::clone(technique)));
            }
        }

        for key in cog.scoring.derived_feature_keys() {
            cog.features.remove(&key);
        }

        let mut values: NamespacedValues = bindings
            .keys()
            .map(|namespace| (namespace.clone(), BTreeMap::new()))
            .collect();
        let mut derived = BTreeSet::new();
        for (namespace, feature_name, technique) in resolved {
            let value = technique.calculate(cog);
            let key = format!("{namespace}.{feature_name}");
            cog.features.insert(key.clone(), value);
            derived.insert(key);
            if namespace == CORE_NAMESPACE {
                cog.features.insert(feature_name.clone(), value);
                derived.insert(feature_name.clone());
                cog.set_core_value(feature_name, value);
            }
            values
                .entry(namespace.clone())
                .or_default()
                .insert(feature_name.clone(), value);
        }

        cog.scoring.feature_techniques = bindings;
        cog.scoring.feature_values = values;
        cog.scoring.metadata.insert(
            DERIVED_FEATURE_KEYS.to_string(),
            Value::from(derived.into_iter().collect::<Vec<_>>()),
        );
        cog.scoring.version += 1;
        Ok(())
    }

    // ----- collections ------------------------------------------------------

    /// Adds or replaces a component.
    pub fn add_component(&mut self, component: Component) {
        self.components.insert(component.id.clone(), component);
    }

    /// Adds a cog, recomputes its features and runs the cascade.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] for a known id and
    /// [`Error::UnknownReference`] for an unregistered technique binding.
    #[instrument(skip(self, cog), fields(cog_id = %cog.id))]
    pub fn add_cog(&mut self, mut cog: Cog) -> Result<CascadeReport> {
        if self.cogs.contains_key(&cog.id) {
            return Err(Error::duplicate("cog", cog.id.as_str()));
        }
        self.recompute_features(&mut cog)?;
        let (id, version) = (cog.id.clone(), cog.version);
        self.cogs.insert(id.clone(), cog);
        Ok(self.on_cog_updated(&id, version))
    }

    /// Applies `updates` to a cog atomically, recomputes its features, bumps
    /// its version and runs the cascade.
    ///
    /// Field names must come from [`WRITABLE_COG_FIELDS`]; values are JSON in
    /// the persisted shape of the field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown cog,
    /// [`Error::UnsupportedField`] for an unknown or read-only field and
    /// [`Error::InvalidInput`] for a value of the wrong shape. No field is
    /// applied when any check fails.
    #[instrument(skip(self, updates), fields(cog_id = %cog_id, field_count = updates.len()))]
    pub fn update_cog(&mut self, cog_id: &str, updates: &Metadata) -> Result<CascadeReport> {
        let mut working = self.require_cog(cog_id)?.clone();
        if let Some(field) = updates.keys().find(|k| {
            READ_ONLY_COG_FIELDS.contains(&k.as_str()) || !WRITABLE_COG_FIELDS.contains(&k.as_str())
        }) {
            return Err(Error::UnsupportedField {
                entity: "cog".to_string(),
                field: field.clone(),
            });
        }

        for (field, value) in updates {
            apply_cog_field(&mut working, field, value.clone())?;
        }
        self.recompute_features(&mut working)?;
        working.version += 1;

        let (id, version) = (working.id.clone(), working.version);
        self.cogs.insert(id.clone(), working);
        Ok(self.on_cog_updated(&id, version))
    }

    // ----- cascade ----------------------------------------------------------

    fn on_cog_updated(&mut self, cog_id: &CogId, version: u64) -> CascadeReport {
        let mut report = CascadeReport::default();
        report.events.push(CascadeEvent::CogUpdated {
            cog_id: cog_id.clone(),
            version,
        });
        tracing::debug!(topic = "cog.updated", cog_id = %cog_id, version, "Cascade event");

        let affected: Vec<String> = self
            .score_sets
            .values()
            .filter(|set| self.strategies.contains_key(&set.strategy_id) && set.tracks(cog_id.as_str()))
            .map(|set| set.id.clone())
            .collect();

        for score_set_id in affected {
            let pairs = self.rescore(&score_set_id, cog_id);
            report.pairs_rescored += pairs;
            report.score_sets_rescored.push(score_set_id.clone());
            report.events.push(CascadeEvent::ScoresUpdated {
                score_set_id: score_set_id.clone(),
                source_cog_id: cog_id.clone(),
            });
            tracing::debug!(
                topic = "scores.updated",
                score_set_id = %score_set_id,
                source_cog_id = %cog_id,
                pairs,
                "Cascade event"
            );
            self.on_scores_updated(&score_set_id, &mut report);
        }

        metrics::counter!("cogmesh_cascade_total").increment(1);
        metrics::counter!("cogmesh_cascade_pairs_rescored_total")
            .increment(report.pairs_rescored as u64);
        report
    }

    /// Recomputes both directions between `cog_id` and every other member of
    /// the score set, bumps its version once and drops its cached indices.
    fn rescore(&mut self, score_set_id: &str, cog_id: &CogId) -> usize {
        let Some(set) = self.score_sets.get_mut(score_set_id) else {
            return 0;
        };
        let Some(strategy) = self.strategies.get(&set.strategy_id) else {
            return 0;
        };
        let Some(source) = self.cogs.get(cog_id) else {
            return 0;
        };

        let members: Vec<&Cog> = match &set.cog_ids {
            Some(ids) => ids.iter().filter_map(|id| self.cogs.get(id)).collect(),
            None => self.cogs.values().collect(),
        };

        let mut pairs = 0;
        for other in members.into_iter().filter(|c| c.id != *cog_id) {
            for (from, to) in [(source, other), (other, source)] {
                let mut entry = strategy.score(from, to);
                entry.strategy_id.clone_from(&set.strategy_id);
                set.insert(entry);
                pairs += 1;
            }
        }
        set.version += 1;
        self.index_cache.invalidate(score_set_id);
        pairs
    }

    fn on_scores_updated(&mut self, score_set_id: &str, report: &mut CascadeReport) {
        let bound: Vec<(String, PathPolicy)> = self
            .graph_policies
            .iter()
            .filter(|(_, policy)| policy.score_set_id == score_set_id)
            .map(|(graph_id, policy)| (graph_id.clone(), policy.clone()))
            .collect();

        for (graph_id, policy) in bound {
            match self.reorder_graph(&graph_id, &policy) {
                Ok(_) => report.graphs_reordered.push(graph_id),
                Err(e) => {
                    tracing::warn!(
                        graph_id = %graph_id,
                        score_set_id,
                        error = %e,
                        "Skipped reorder of bound graph"
                    );
                    report.graphs_skipped.push((graph_id, e.to_string()));
                },
            }
        }
    }

    // ----- score sets and indices -------------------------------------------

    /// Builds the full directed matrix for `strategy_id` over `cog_ids`
    /// (default: every known cog, and the set keeps tracking new cogs),
    /// replacing any score set with the same id.
    ///
    /// Costs `n * (n - 1)` strategy calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown strategy, cog or
    /// technique binding. The system is unchanged on error.
    #[instrument(skip(self, cog_ids), fields(score_set_id = %score_set_id, strategy_id = %strategy_id))]
    pub fn create_score_set(
        &mut self,
        score_set_id: &str,
        strategy_id: &str,
        context_hash: &str,
        cog_ids: Option<&[CogId]>,
    ) -> Result<&ScoreSet> {
        let strategy = self.require_strategy(strategy_id)?;
        let members: BTreeSet<CogId> = match cog_ids {
            Some(ids) => ids.iter().cloned().collect(),
            None => self.cogs.keys().cloned().collect(),
        };

        let mut recomputed = BTreeMap::new();
        for id in &members {
            let mut cog = self.require_cog(id.as_str())?.clone();
            self.recompute_features(&mut cog)?;
            recomputed.insert(id.clone(), cog);
        }

        let mut score_set = ScoreSet::new(score_set_id, strategy_id, context_hash);
        for from in recomputed.values() {
            for to in recomputed.values().filter(|to| to.id != from.id) {
                let mut entry = strategy.score(from, to);
                entry.strategy_id = strategy_id.to_string();
                score_set.insert(entry);
            }
        }
        if cog_ids.is_some() {
            score_set.cog_ids = Some(members);
        }
        if let Some(previous) = self.score_sets.get(score_set_id) {
            score_set.version = previous.version + 1;
        }

        tracing::info!(entries = score_set.entries.len(), "Created score set");
        metrics::counter!("cogmesh_score_sets_created_total").increment(1);
        self.cogs.extend(recomputed);
        self.index_cache.invalidate(score_set_id);
        self.score_sets.insert(score_set_id.to_string(), score_set);
        self.require_score_set(score_set_id)
    }

    pub(crate) fn require_score_set(&self, score_set_id: &str) -> Result<&ScoreSet> {
        self.score_sets
            .get(score_set_id)
            .ok_or_else(|| Error::unknown("score set", score_set_id))
    }

    /// Returns the neighbor index for a score set, building it on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown score set.
    pub fn neighbor_index(
        &mut self,
        score_set_id: &str,
        mode: DirectionMode,
    ) -> Result<Arc<NeighborIndex>> {
        let score_set = self
            .score_sets
            .get(score_set_id)
            .ok_or_else(|| Error::unknown("score set", score_set_id))?;
        Ok(self.index_cache.get_or_build(score_set, mode))
    }

    // ----- snapshots --------------------------------------------------------

    /// Deep-copies every mutable collection into a snapshot.
    #[must_use]
    pub fn snapshot(&self, snapshot_id: &str, meta: Option<Metadata>) -> Snapshot {
        let mut snapshot = Snapshot::empty(snapshot_id);
        snapshot.meta = meta.unwrap_or_default();
        snapshot.cogs = self.cogs.clone();
        snapshot.components = self.components.clone();
        snapshot.graphs = self.graphs.clone();
        snapshot.score_sets = self.score_sets.clone();
        snapshot.lineage = self.lineage.clone();
        snapshot
    }

    /// Replaces every mutable collection with copies from `snapshot`.
    ///
    /// The index cache is always cleared. Policy bindings are cleared when
    /// `reset_policies` is set; otherwise bindings whose graph or score set
    /// the snapshot lacks are dropped.
    #[instrument(skip(self, snapshot), fields(snapshot_id = %snapshot.id))]
    pub fn load_snapshot(&mut self, snapshot: &Snapshot, reset_policies: bool) {
        self.cogs = snapshot.cogs.clone();
        self.components = snapshot.components.clone();
        self.graphs = snapshot.graphs.clone();
        self.score_sets = snapshot.score_sets.clone();
        self.lineage = snapshot.lineage.clone();
        self.index_cache.clear();
        if reset_policies {
            self.graph_policies.clear();
        } else {
            let (graphs, score_sets) = (&self.graphs, &self.score_sets);
            self.graph_policies.retain(|graph_id, policy| {
                let keep = graphs.contains_key(graph_id.as_str())
                    && score_sets.contains_key(policy.score_set_id.as_str());
                if !keep {
                    tracing::warn!(graph_id = %graph_id, "Dropped policy binding absent from snapshot");
                }
                keep
            });
        }
        tracing::info!(reset_policies, "Loaded snapshot");
    }
}

fn apply_cog_field(cog: &mut Cog, field: &str, value: Value) -> Result<()> {
    let invalid = |e: serde_json::Error| Error::InvalidInput(format!("cog field '{field}': {e}"));
    match field {
        "theme" => cog.theme = serde_json::from_value(value).map_err(invalid)?,
        "breadth" => cog.breadth = serde_json::from_value(value).map_err(invalid)?,
        "depth" => cog.depth = serde_json::from_value(value).map_err(invalid)?,
        "volume" => cog.volume = serde_json::from_value(value).map_err(invalid)?,
        "content" => cog.content = serde_json::from_value(value).map_err(invalid)?,
        "component_ids" => cog.component_ids = serde_json::from_value(value).map_err(invalid)?,
        "features" => cog.features = serde_json::from_value(value).map_err(invalid)?,
        "metadata" => cog.metadata = serde_json::from_value(value).map_err(invalid)?,
        "scoring" => cog.scoring = serde_json::from_value(value).map_err(invalid)?,
        other => {
            return Err(Error::UnsupportedField {
                entity: "cog".to_string(),
                field: other.to_string(),
            });
        },
    }
    Ok(())
}
