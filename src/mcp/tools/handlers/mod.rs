//! Tool execution handlers.
//!
//! Every handler takes the runtime selected for the call and the arguments
//! with scope keys removed.

mod cogs;
mod graph;
mod workspace;

pub use cogs::{
    execute_cog_add, execute_cog_compose, execute_cog_split, execute_cog_update,
    execute_component_add,
};
pub use graph::{
    execute_build_chain, execute_graph_bind_policy, execute_graph_create, execute_graph_reorder,
    execute_graph_set_base, execute_graph_set_hidden_layers, execute_graph_swap_buckets,
    execute_index_neighbors, execute_render_graph, execute_run_auto, execute_score_set_create,
};
pub use workspace::{
    execute_register_feature_plugin, execute_register_preset, execute_runtime_info,
    execute_snapshot_load, execute_snapshot_save, execute_strategy_presets,
};
