//! Tool definitions.
//!
//! Contains the JSON Schema definitions for every cogmesh tool. Each schema
//! also accepts the scope keys added by [`scoped`].

use super::ToolDefinition;
use crate::services::MAX_AUTO_ITERATIONS;
use serde_json::{Value, json};

/// Adds the optional `manager_service` and `workspace_id` properties.
fn scoped(mut schema: Value) -> Value {
    if let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) {
        properties.insert(
            "manager_service".to_string(),
            json!({
                "type": "string",
                "description": "Owning service; defaults to the configured manager service"
            }),
        );
        properties.insert(
            "workspace_id".to_string(),
            json!({
                "type": "string",
                "description": "Workspace within the service (default: default)"
            }),
        );
    }
    schema
}

fn definition(name: &str, description: &str, schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: scoped(schema),
    }
}

fn policy_schema() -> Value {
    json!({
        "type": "object",
        "description": "Path policy",
        "properties": {
            "strategy_id": { "type": "string" },
            "score_set_id": { "type": "string" },
            "direction_mode": { "type": "string", "enum": ["directed", "symmetrized"] },
            "unseen_only": { "type": "boolean", "default": true },
            "include_hidden_layers": { "type": "boolean", "default": false },
            "equivalence_epsilon": { "type": "number", "minimum": 0 },
            "group_range": { "type": "number", "minimum": 0 },
            "min_score": { "type": "number" },
            "max_depth": { "type": "integer", "minimum": 0 },
            "tags": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["strategy_id", "score_set_id"]
    })
}

fn bucket_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["adjacent", "layered"],
        "description": "Target bucket (default: layered)"
    })
}

fn id_list(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

/// Defines the runtime info tool.
pub fn runtime_info_tool() -> ToolDefinition {
    definition(
        "runtime.info",
        "Show the scope, storage root, active snapshot and entity counts of a workspace",
        json!({ "type": "object", "properties": {} }),
    )
}

/// Defines the strategy presets tool.
pub fn strategy_presets_tool() -> ToolDefinition {
    definition(
        "strategy.presets",
        "List the built-in weighted strategy presets",
        json!({ "type": "object", "properties": {} }),
    )
}

/// Defines the register preset tool.
pub fn register_preset_tool() -> ToolDefinition {
    definition(
        "strategy.register_preset",
        "Build a weighted strategy from a preset and register it",
        json!({
            "type": "object",
            "properties": {
                "preset_id": { "type": "string", "description": "Built-in preset" },
                "strategy_id": { "type": "string", "description": "Id to register the strategy under" },
                "overrides": { "type": "object", "description": "Strategy fields replacing the preset defaults" }
            },
            "required": ["preset_id", "strategy_id"]
        }),
    )
}

/// Defines the register feature plugin tool.
pub fn register_feature_plugin_tool() -> ToolDefinition {
    definition(
        "plugin.register_feature",
        "Register every feature technique of a catalog bundle",
        json!({
            "type": "object",
            "properties": {
                "plugin": { "type": "string", "description": "Bundle name, e.g. shape" },
                "use_as_default": { "type": "boolean", "default": false }
            },
            "required": ["plugin"]
        }),
    )
}

/// Defines the snapshot save tool.
pub fn snapshot_save_tool() -> ToolDefinition {
    definition(
        "snapshot.save",
        "Save the workspace state as a JSON snapshot under the storage root",
        json!({
            "type": "object",
            "properties": {
                "snapshot_id": { "type": "string" },
                "path": { "type": "string", "description": "Relative path (default: snapshots/<snapshot_id>.json)" },
                "meta": { "type": "object" }
            },
            "required": ["snapshot_id"]
        }),
    )
}

/// Defines the snapshot load tool.
pub fn snapshot_load_tool() -> ToolDefinition {
    definition(
        "snapshot.load",
        "Replace the workspace state with a saved snapshot",
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Relative path under the storage root" },
                "reset_policies": { "type": "boolean", "default": true }
            },
            "required": ["path"]
        }),
    )
}

/// Defines the component add tool.
pub fn component_add_tool() -> ToolDefinition {
    definition(
        "component.add",
        "Add or replace a component",
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "kind": { "type": "string" },
                "payload": {},
                "feature_values": { "type": "object", "additionalProperties": { "type": "number" } },
                "metadata": { "type": "object" }
            },
            "required": ["id", "kind"]
        }),
    )
}

/// Defines the cog add tool.
pub fn cog_add_tool() -> ToolDefinition {
    definition(
        "cog.add",
        "Add a cog, recompute its features and rescore open score sets",
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "theme": { "type": "string" },
                "content": { "type": "string" },
                "breadth": { "type": "number" },
                "depth": { "type": "number" },
                "volume": { "type": "number" },
                "component_ids": id_list("Referenced components"),
                "features": { "type": "object", "additionalProperties": { "type": "number" } },
                "metadata": { "type": "object" },
                "feature_techniques": {
                    "type": "object",
                    "description": "namespace -> feature_name -> technique_id"
                }
            },
            "required": ["id"]
        }),
    )
}

/// Defines the cog update tool.
pub fn cog_update_tool() -> ToolDefinition {
    definition(
        "cog.update",
        "Update cog fields and cascade to score sets and bound graphs",
        json!({
            "type": "object",
            "properties": {
                "cog_id": { "type": "string" },
                "fields": {
                    "type": "object",
                    "description": "theme, breadth, depth, volume, content, component_ids, features, metadata or scoring"
                }
            },
            "required": ["cog_id", "fields"]
        }),
    )
}

/// Defines the cog compose tool.
pub fn cog_compose_tool() -> ToolDefinition {
    definition(
        "cog.compose",
        "Merge two or more cogs into a new cog",
        json!({
            "type": "object",
            "properties": {
                "cog_ids": { "type": "array", "items": { "type": "string" }, "minItems": 2 },
                "new_cog_id": { "type": "string" },
                "theme": { "type": "string", "description": "Default: unique source themes joined by ' + '" },
                "graph_id": { "type": "string" },
                "bucket": bucket_schema()
            },
            "required": ["cog_ids", "new_cog_id"]
        }),
    )
}

/// Defines the cog split tool.
pub fn cog_split_tool() -> ToolDefinition {
    definition(
        "cog.split",
        "Split a cog's content into one child cog per word or letter",
        json!({
            "type": "object",
            "properties": {
                "cog_id": { "type": "string" },
                "mode": { "type": "string", "enum": ["words", "chars"], "default": "words" },
                "new_cog_prefix": { "type": "string", "description": "Default: <cog_id>_split" },
                "max_items": { "type": "integer", "minimum": 0 },
                "graph_id": { "type": "string" },
                "bucket": bucket_schema()
            },
            "required": ["cog_id"]
        }),
    )
}

/// Defines the graph create tool.
pub fn graph_create_tool() -> ToolDefinition {
    definition(
        "graph.create",
        "Create a graph from a base cog and two buckets",
        json!({
            "type": "object",
            "properties": {
                "graph_id": { "type": "string" },
                "base_cog_id": { "type": "string" },
                "adjacent": id_list("Adjacent bucket"),
                "layered": id_list("Layered bucket"),
                "hidden_layers": { "type": "array", "items": { "type": "integer" } },
                "context_hash": { "type": "string" }
            },
            "required": ["graph_id", "base_cog_id"]
        }),
    )
}

/// Defines the graph bind policy tool.
pub fn graph_bind_policy_tool() -> ToolDefinition {
    definition(
        "graph.bind_policy",
        "Bind a path policy so cascades reorder the graph",
        json!({
            "type": "object",
            "properties": {
                "graph_id": { "type": "string" },
                "policy": policy_schema()
            },
            "required": ["graph_id", "policy"]
        }),
    )
}

/// Defines the graph reorder tool.
pub fn graph_reorder_tool() -> ToolDefinition {
    definition(
        "graph.reorder",
        "Sort both buckets by similarity to the base",
        json!({
            "type": "object",
            "properties": {
                "graph_id": { "type": "string" },
                "policy": policy_schema()
            },
            "required": ["graph_id"]
        }),
    )
}

/// Defines the graph set base tool.
pub fn graph_set_base_tool() -> ToolDefinition {
    definition(
        "graph.set_base",
        "Move the base to another member; reorders when a policy is given",
        json!({
            "type": "object",
            "properties": {
                "graph_id": { "type": "string" },
                "base_cog_id": { "type": "string" },
                "policy": policy_schema()
            },
            "required": ["graph_id", "base_cog_id"]
        }),
    )
}

/// Defines the graph swap buckets tool.
pub fn graph_swap_buckets_tool() -> ToolDefinition {
    definition(
        "graph.swap_buckets",
        "Exchange the adjacent and layered buckets",
        json!({
            "type": "object",
            "properties": { "graph_id": { "type": "string" } },
            "required": ["graph_id"]
        }),
    )
}

/// Defines the graph hidden layers tool.
pub fn graph_set_hidden_layers_tool() -> ToolDefinition {
    definition(
        "graph.set_hidden_layers",
        "Replace the set of hidden layers",
        json!({
            "type": "object",
            "properties": {
                "graph_id": { "type": "string" },
                "hidden_layers": { "type": "array", "items": { "type": "integer" } }
            },
            "required": ["graph_id", "hidden_layers"]
        }),
    )
}

/// Defines the score set create tool.
pub fn score_set_create_tool() -> ToolDefinition {
    definition(
        "score_set.create",
        "Score every ordered pair of cogs with a registered strategy",
        json!({
            "type": "object",
            "properties": {
                "score_set_id": { "type": "string" },
                "strategy_id": { "type": "string" },
                "context_hash": { "type": "string" },
                "cog_ids": id_list("Closed member subset; omit to track every cog")
            },
            "required": ["score_set_id", "strategy_id"]
        }),
    )
}

/// Defines the index neighbors tool.
pub fn index_neighbors_tool() -> ToolDefinition {
    definition(
        "index.neighbors",
        "List a cog's ranked neighbors",
        json!({
            "type": "object",
            "properties": {
                "score_set_id": { "type": "string" },
                "cog_id": { "type": "string" },
                "direction_mode": { "type": "string", "enum": ["directed", "symmetrized"] },
                "limit": { "type": "integer", "minimum": 0 }
            },
            "required": ["score_set_id", "cog_id"]
        }),
    )
}

/// Defines the build chain tool.
pub fn build_chain_tool() -> ToolDefinition {
    definition(
        "iteration.build_chain",
        "Walk greedily from the base to the best unvisited neighbor",
        json!({
            "type": "object",
            "properties": {
                "graph_id": { "type": "string" },
                "policy": policy_schema(),
                "start_cog_id": { "type": "string" },
                "initial_seen": id_list("Cogs treated as visited")
            },
            "required": ["graph_id"]
        }),
    )
}

/// Defines the run auto tool.
pub fn run_auto_tool() -> ToolDefinition {
    definition(
        "iteration.run_auto",
        "Repeat reorder and chain building, optionally advancing the base",
        json!({
            "type": "object",
            "properties": {
                "graph_id": { "type": "string" },
                "policy": policy_schema(),
                "iterations": { "type": "integer", "minimum": 0, "maximum": MAX_AUTO_ITERATIONS, "default": 1 },
                "advance_base": { "type": "boolean", "default": false }
            },
            "required": ["graph_id"]
        }),
    )
}

/// Defines the render graph tool.
pub fn render_graph_tool() -> ToolDefinition {
    definition(
        "render.graph",
        "Render a graph as text, optionally with a similarity table",
        json!({
            "type": "object",
            "properties": {
                "graph_id": { "type": "string" },
                "show_components": { "type": "boolean", "default": true },
                "score_set_id": { "type": "string" },
                "direction_mode": { "type": "string", "enum": ["directed", "symmetrized"] }
            },
            "required": ["graph_id"]
        }),
    )
}
