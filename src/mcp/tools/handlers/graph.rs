//! Graph, scoring, traversal and rendering handlers.

use crate::mcp::runtime::WorkspaceRuntime;
use crate::mcp::tool_types::{
    BindPolicyArgs, BuildChainArgs, GraphCreateArgs, GraphIdArgs, GraphPolicyArgs,
    HiddenLayersArgs, NeighborsArgs, RenderGraphArgs, RunAutoArgs, ScoreSetCreateArgs,
    SetBaseArgs, parse_args,
};
use crate::models::{CogGraph, CogId, DirectionMode, PathPolicy};
use crate::rendering::AsciiRenderer;
use crate::services::IterationEngine;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::collections::BTreeSet;

use super::super::ToolResult;

/// Picks the explicit policy, or the one bound to the graph.
fn resolve_policy(
    runtime: &WorkspaceRuntime,
    graph_id: &str,
    explicit: Option<PathPolicy>,
) -> Result<PathPolicy> {
    runtime.system.require_graph(graph_id)?;
    match explicit {
        Some(policy) => {
            policy.validate()?;
            Ok(policy)
        },
        None => runtime.system.graph_policy(graph_id).cloned().ok_or_else(|| {
            Error::PreconditionFailed(format!(
                "graph '{graph_id}' has no bound policy and none was given"
            ))
        }),
    }
}

fn parse_mode(mode: Option<&str>) -> Result<DirectionMode> {
    mode.map_or(Ok(DirectionMode::Directed), DirectionMode::parse)
}

fn graph_json(runtime: &WorkspaceRuntime, graph_id: &str) -> Result<ToolResult> {
    ToolResult::json(runtime.system.require_graph(graph_id)?)
}

/// Executes `graph.create`.
pub fn execute_graph_create(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: GraphCreateArgs = parse_args(arguments)?;
    let mut graph = CogGraph::new(&args.graph_id, args.base_cog_id)
        .with_adjacent(args.adjacent)
        .with_layered(args.layered)
        .with_hidden_layers(args.hidden_layers);
    if let Some(context_hash) = args.context_hash {
        graph = graph.with_context_hash(context_hash);
    }
    runtime.system.add_graph(graph)?;
    graph_json(runtime, &args.graph_id)
}

/// Executes `graph.bind_policy`.
pub fn execute_graph_bind_policy(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: BindPolicyArgs = parse_args(arguments)?;
    let score_set_id = args.policy.score_set_id.clone();
    runtime.system.bind_graph_policy(&args.graph_id, args.policy)?;
    ToolResult::json(&json!({
        "graph_id": args.graph_id,
        "score_set_id": score_set_id,
        "bound": true,
    }))
}

/// Executes `graph.reorder`.
pub fn execute_graph_reorder(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: GraphPolicyArgs = parse_args(arguments)?;
    let policy = resolve_policy(runtime, &args.graph_id, args.policy)?;
    IterationEngine::new(&mut runtime.system).run_manual_reorder(&args.graph_id, &policy)?;
    graph_json(runtime, &args.graph_id)
}

/// Executes `graph.set_base`.
pub fn execute_graph_set_base(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: SetBaseArgs = parse_args(arguments)?;
    match args.policy {
        Some(policy) => {
            let policy = resolve_policy(runtime, &args.graph_id, Some(policy))?;
            IterationEngine::new(&mut runtime.system).run_manual_set_base(
                &args.graph_id,
                &args.base_cog_id,
                &policy,
            )?;
        },
        None => {
            runtime.system.set_graph_base(&args.graph_id, &args.base_cog_id)?;
        },
    }
    graph_json(runtime, &args.graph_id)
}

/// Executes `graph.swap_buckets`.
pub fn execute_graph_swap_buckets(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: GraphIdArgs = parse_args(arguments)?;
    IterationEngine::new(&mut runtime.system).run_manual_swap(&args.graph_id)?;
    graph_json(runtime, &args.graph_id)
}

/// Executes `graph.set_hidden_layers`.
pub fn execute_graph_set_hidden_layers(
    runtime: &mut WorkspaceRuntime,
    arguments: Value,
) -> Result<ToolResult> {
    let args: HiddenLayersArgs = parse_args(arguments)?;
    runtime
        .system
        .set_hidden_layers(&args.graph_id, args.hidden_layers.into_iter().collect())?;
    graph_json(runtime, &args.graph_id)
}

/// Executes `score_set.create`.
pub fn execute_score_set_create(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: ScoreSetCreateArgs = parse_args(arguments)?;
    let members: Option<Vec<CogId>> = args
        .cog_ids
        .map(|ids| ids.into_iter().map(CogId::from).collect());
    let score_set = runtime.system.create_score_set(
        &args.score_set_id,
        &args.strategy_id,
        &args.context_hash,
        members.as_deref(),
    )?;
    ToolResult::json(&json!({
        "score_set_id": score_set.id,
        "strategy_id": score_set.strategy_id,
        "version": score_set.version,
        "entries": score_set.entries.len(),
        "closed": score_set.cog_ids.is_some(),
    }))
}

/// Executes `index.neighbors`.
pub fn execute_index_neighbors(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: NeighborsArgs = parse_args(arguments)?;
    let mode = parse_mode(args.direction_mode.as_deref())?;
    runtime.system.require_cog(&args.cog_id)?;
    let index = runtime.system.neighbor_index(&args.score_set_id, mode)?;

    let limit = args.limit.unwrap_or(usize::MAX);
    let neighbors: Vec<Value> = index
        .neighbors(&args.cog_id)
        .into_iter()
        .take(limit)
        .map(|n| {
            json!({
                "to_cog_id": n.to_cog_id,
                "score": n.score,
                "variance": n.variance,
                "strategy_id": n.strategy_id,
            })
        })
        .collect();
    ToolResult::json(&json!({
        "score_set_id": args.score_set_id,
        "direction_mode": mode.as_str(),
        "cog_id": args.cog_id,
        "neighbors": neighbors,
    }))
}

/// Executes `iteration.build_chain`.
pub fn execute_build_chain(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: BuildChainArgs = parse_args(arguments)?;
    let policy = resolve_policy(runtime, &args.graph_id, args.policy)?;
    let initial_seen: Option<BTreeSet<CogId>> = args
        .initial_seen
        .map(|ids| ids.into_iter().map(CogId::from).collect());

    let result = IterationEngine::new(&mut runtime.system).build_chain(
        &args.graph_id,
        &policy,
        args.start_cog_id.as_deref(),
        initial_seen.as_ref(),
    )?;
    ToolResult::json(&json!({
        "result": result,
        "rendered": AsciiRenderer::render_chain(&result),
    }))
}

/// Executes `iteration.run_auto`.
pub fn execute_run_auto(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: RunAutoArgs = parse_args(arguments)?;
    let policy = resolve_policy(runtime, &args.graph_id, args.policy)?;

    let results = IterationEngine::new(&mut runtime.system).run_auto(
        &args.graph_id,
        &policy,
        args.iterations,
        args.advance_base,
    )?;
    let rendered: Vec<String> = results.iter().map(AsciiRenderer::render_chain).collect();
    ToolResult::json(&json!({
        "results": results,
        "rendered": rendered,
    }))
}

/// Executes `render.graph`.
///
/// Returns plain text rather than JSON.
pub fn execute_render_graph(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: RenderGraphArgs = parse_args(arguments)?;
    let mut text = AsciiRenderer::render_graph(&runtime.system, &args.graph_id, args.show_components)?;
    if let Some(score_set_id) = args.score_set_id {
        let mode = parse_mode(args.direction_mode.as_deref())?;
        let similarity =
            AsciiRenderer::render_similarity(&mut runtime.system, &args.graph_id, &score_set_id, mode)?;
        text.push_str("\n\n");
        text.push_str(&similarity);
    }
    Ok(ToolResult::text(text))
}
