//! Argument types for tool calls.
//!
//! Scope keys (`manager_service`, `workspace_id`) are stripped by the
//! dispatcher before these types are parsed, so every struct rejects unknown
//! fields.

use crate::models::{Metadata, PathPolicy, TechniqueBindings};
use crate::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parses tool arguments, treating `null` as an empty object.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when the arguments do not match `T`.
pub fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Arguments for tools that take none.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

/// Arguments for `strategy.register_preset`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterPresetArgs {
    /// Preset to build from.
    pub preset_id: String,
    /// Id the strategy is registered under.
    pub strategy_id: String,
    /// Field overrides applied over the preset defaults.
    pub overrides: Option<Metadata>,
}

/// Arguments for `plugin.register_feature`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterFeaturePluginArgs {
    /// Catalog bundle name.
    pub plugin: String,
    /// Bind the bundle's techniques to every cog.
    #[serde(default)]
    pub use_as_default: bool,
}

/// Arguments for `snapshot.save`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotSaveArgs {
    /// Snapshot id; also names the default file.
    pub snapshot_id: String,
    /// Path relative to the workspace storage root.
    pub path: Option<String>,
    /// Free-form metadata stored with the snapshot.
    pub meta: Option<Metadata>,
}

/// Arguments for `snapshot.load`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotLoadArgs {
    /// Path relative to the workspace storage root.
    pub path: String,
    /// Drop policy bindings after loading.
    #[serde(default = "default_true")]
    pub reset_policies: bool,
}

/// Arguments for `cog.compose`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposeArgs {
    /// At least two source cogs.
    pub cog_ids: Vec<String>,
    /// Id of the composed cog.
    pub new_cog_id: String,
    /// Theme override.
    pub theme: Option<String>,
    /// Graph to attach the new cog to.
    pub graph_id: Option<String>,
    /// Bucket within the graph; defaults to `layered`.
    pub bucket: Option<String>,
}

/// Arguments for `cog.split`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitArgs {
    /// Cog to split.
    pub cog_id: String,
    /// `words` or `chars`.
    #[serde(default = "default_split_mode")]
    pub mode: String,
    /// Prefix for child ids.
    pub new_cog_prefix: Option<String>,
    /// Upper bound on children.
    pub max_items: Option<usize>,
    /// Graph to attach the children to.
    pub graph_id: Option<String>,
    /// Bucket within the graph; defaults to `layered`.
    pub bucket: Option<String>,
}

/// Arguments for `component.add`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentAddArgs {
    /// Component id.
    pub id: String,
    /// Component kind.
    pub kind: String,
    /// Opaque payload.
    #[serde(default)]
    pub payload: Value,
    /// Scalar feature values.
    #[serde(default)]
    pub feature_values: BTreeMap<String, f64>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Arguments for `cog.add`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CogAddArgs {
    /// Cog id.
    pub id: String,
    /// Theme label.
    #[serde(default)]
    pub theme: String,
    /// Text content.
    #[serde(default)]
    pub content: String,
    /// Initial `core.breadth`.
    pub breadth: Option<f64>,
    /// Initial `core.depth`.
    pub depth: Option<f64>,
    /// Initial `core.volume`.
    pub volume: Option<f64>,
    /// Referenced components.
    #[serde(default)]
    pub component_ids: Vec<String>,
    /// Flat scalar features.
    #[serde(default)]
    pub features: BTreeMap<String, f64>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// `namespace -> feature_name -> technique_id` bindings.
    #[serde(default)]
    pub feature_techniques: TechniqueBindings,
}

/// Arguments for `cog.update`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CogUpdateArgs {
    /// Cog to update.
    pub cog_id: String,
    /// Field name to new value.
    pub fields: Metadata,
}

/// Arguments for `graph.create`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphCreateArgs {
    /// Graph id.
    pub graph_id: String,
    /// Base cog; must be a member.
    pub base_cog_id: String,
    /// Adjacent bucket.
    #[serde(default)]
    pub adjacent: Vec<String>,
    /// Layered bucket.
    #[serde(default)]
    pub layered: Vec<String>,
    /// Hidden layer numbers.
    #[serde(default)]
    pub hidden_layers: Vec<i64>,
    /// Caller-defined context label.
    pub context_hash: Option<String>,
}

/// Arguments for `graph.bind_policy`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindPolicyArgs {
    /// Graph to bind.
    pub graph_id: String,
    /// Policy value.
    pub policy: PathPolicy,
}

/// Arguments for graph operations that can fall back to the bound policy.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphPolicyArgs {
    /// Target graph.
    pub graph_id: String,
    /// Policy to use instead of the bound one.
    pub policy: Option<PathPolicy>,
}

/// Arguments for `graph.set_base`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetBaseArgs {
    /// Target graph.
    pub graph_id: String,
    /// New base cog; must be a member.
    pub base_cog_id: String,
    /// When given, the graph is reordered from the new base.
    pub policy: Option<PathPolicy>,
}

/// Arguments for `graph.swap_buckets`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphIdArgs {
    /// Target graph.
    pub graph_id: String,
}

/// Arguments for `graph.set_hidden_layers`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HiddenLayersArgs {
    /// Target graph.
    pub graph_id: String,
    /// Layer numbers to hide.
    pub hidden_layers: Vec<i64>,
}

/// Arguments for `score_set.create`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreSetCreateArgs {
    /// Score set id; an existing set is replaced.
    pub score_set_id: String,
    /// Registered strategy.
    pub strategy_id: String,
    /// Caller-defined context label.
    #[serde(default)]
    pub context_hash: String,
    /// Explicit member subset; omitted means every cog.
    pub cog_ids: Option<Vec<String>>,
}

/// Arguments for `index.neighbors`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NeighborsArgs {
    /// Score set to index.
    pub score_set_id: String,
    /// Source cog.
    pub cog_id: String,
    /// `directed` or `symmetrized`.
    pub direction_mode: Option<String>,
    /// Maximum neighbors returned.
    pub limit: Option<usize>,
}

/// Arguments for `iteration.build_chain`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildChainArgs {
    /// Graph to traverse.
    pub graph_id: String,
    /// Policy to use instead of the bound one.
    pub policy: Option<PathPolicy>,
    /// Start cog; defaults to the base.
    pub start_cog_id: Option<String>,
    /// Cogs treated as already visited.
    pub initial_seen: Option<Vec<String>>,
}

/// Arguments for `iteration.run_auto`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunAutoArgs {
    /// Graph to iterate.
    pub graph_id: String,
    /// Policy to use instead of the bound one.
    pub policy: Option<PathPolicy>,
    /// Number of reorder and chain rounds.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Move the base to the second chain element between rounds.
    #[serde(default)]
    pub advance_base: bool,
}

/// Arguments for `render.graph`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderGraphArgs {
    /// Graph to render.
    pub graph_id: String,
    /// List components under each cog.
    #[serde(default = "default_true")]
    pub show_components: bool,
    /// Append a similarity table from this score set.
    pub score_set_id: Option<String>,
    /// Direction mode of the similarity table.
    pub direction_mode: Option<String>,
}

const fn default_true() -> bool {
    true
}

const fn default_iterations() -> usize {
    1
}

fn default_split_mode() -> String {
    "words".to_string()
}
