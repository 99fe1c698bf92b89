//! Tool implementations.
//!
//! # Module Structure
//!
//! - [`definitions`]: Tool schema definitions (JSON Schema for input validation)
//! - [`handlers`]: Tool execution logic, grouped by workspace, cog and graph
//!   operations

mod definitions;
mod handlers;

use super::runtime::WorkspaceRuntime;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Registry of tools.
pub struct ToolRegistry {
    /// Available tools.
    tools: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Creates a new tool registry with all cogmesh tools.
    #[must_use]
    pub fn new() -> Self {
        let definitions = [
            definitions::runtime_info_tool(),
            definitions::strategy_presets_tool(),
            definitions::register_preset_tool(),
            definitions::register_feature_plugin_tool(),
            definitions::snapshot_save_tool(),
            definitions::snapshot_load_tool(),
            definitions::component_add_tool(),
            definitions::cog_add_tool(),
            definitions::cog_update_tool(),
            definitions::cog_compose_tool(),
            definitions::cog_split_tool(),
            definitions::graph_create_tool(),
            definitions::graph_bind_policy_tool(),
            definitions::graph_reorder_tool(),
            definitions::graph_set_base_tool(),
            definitions::graph_swap_buckets_tool(),
            definitions::graph_set_hidden_layers_tool(),
            definitions::score_set_create_tool(),
            definitions::index_neighbors_tool(),
            definitions::build_chain_tool(),
            definitions::run_auto_tool(),
            definitions::render_graph_tool(),
        ];
        let tools = definitions
            .into_iter()
            .map(|definition| (definition.name.clone(), definition))
            .collect();
        Self { tools }
    }

    /// Returns all tool definitions, sorted by name.
    #[must_use]
    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        let mut tools: Vec<&ToolDefinition> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Executes a tool against one workspace runtime.
    ///
    /// `arguments` must not carry the scope keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown tool, otherwise the
    /// handler's error.
    pub fn execute(
        &self,
        runtime: &mut WorkspaceRuntime,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult> {
        match name {
            "runtime.info" => handlers::execute_runtime_info(runtime, arguments),
            "strategy.presets" => handlers::execute_strategy_presets(runtime, arguments),
            "strategy.register_preset" => handlers::execute_register_preset(runtime, arguments),
            "plugin.register_feature" => handlers::execute_register_feature_plugin(runtime, arguments),
            "snapshot.save" => handlers::execute_snapshot_save(runtime, arguments),
            "snapshot.load" => handlers::execute_snapshot_load(runtime, arguments),
            // Cogs and components
            "component.add" => handlers::execute_component_add(runtime, arguments),
            "cog.add" => handlers::execute_cog_add(runtime, arguments),
            "cog.update" => handlers::execute_cog_update(runtime, arguments),
            "cog.compose" => handlers::execute_cog_compose(runtime, arguments),
            "cog.split" => handlers::execute_cog_split(runtime, arguments),
            // Graphs, scoring and traversal
            "graph.create" => handlers::execute_graph_create(runtime, arguments),
            "graph.bind_policy" => handlers::execute_graph_bind_policy(runtime, arguments),
            "graph.reorder" => handlers::execute_graph_reorder(runtime, arguments),
            "graph.set_base" => handlers::execute_graph_set_base(runtime, arguments),
            "graph.swap_buckets" => handlers::execute_graph_swap_buckets(runtime, arguments),
            "graph.set_hidden_layers" => handlers::execute_graph_set_hidden_layers(runtime, arguments),
            "score_set.create" => handlers::execute_score_set_create(runtime, arguments),
            "index.neighbors" => handlers::execute_index_neighbors(runtime, arguments),
            "iteration.build_chain" => handlers::execute_build_chain(runtime, arguments),
            "iteration.run_auto" => handlers::execute_run_auto(runtime, arguments),
            "render.graph" => handlers::execute_render_graph(runtime, arguments),
            _ => Err(Error::unknown("tool", name)),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Definition of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// A successful plain-text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// A successful result holding `value` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| Error::failed("serialize_tool_result", e))?;
        Ok(Self::text(text))
    }

    /// An error result carrying the message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: message.into() }],
            is_error: true,
        }
    }

    /// Text of the first content item.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|ToolContent::Text { text }| text.as_str())
    }
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}
