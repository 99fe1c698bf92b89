//! Cog and component handlers.

use crate::mcp::runtime::WorkspaceRuntime;
use crate::mcp::tool_types::{
    CogAddArgs, CogUpdateArgs, ComponentAddArgs, ComposeArgs, SplitArgs, parse_args,
};
use crate::models::{Bucket, Cog, Component};
use crate::services::{ComposeRequest, SplitMode, SplitRequest};
use crate::Result;
use serde_json::{Value, json};

use super::super::ToolResult;

fn placement_bucket(bucket: Option<&str>) -> Result<Bucket> {
    bucket.map_or(Ok(Bucket::Layered), Bucket::parse)
}

/// Executes `component.add`.
pub fn execute_component_add(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: ComponentAddArgs = parse_args(arguments)?;
    let mut component = Component::new(args.id, args.kind).with_payload(args.payload);
    component.feature_values = args.feature_values;
    component.metadata = args.metadata;
    let component_id = component.id.clone();
    runtime.system.add_component(component);
    ToolResult::json(&json!({ "component_id": component_id }))
}

/// Executes `cog.add`.
pub fn execute_cog_add(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: CogAddArgs = parse_args(arguments)?;
    let mut cog = Cog::new(args.id, args.theme).with_content(args.content);
    cog.breadth = args.breadth.unwrap_or_default();
    cog.depth = args.depth.unwrap_or_default();
    cog.volume = args.volume.unwrap_or_default();
    cog.component_ids = args.component_ids;
    cog.features = args.features;
    cog.metadata = args.metadata;
    cog.scoring.feature_techniques = args.feature_techniques;

    let cog_id = cog.id.clone();
    let cascade = runtime.system.add_cog(cog)?;
    ToolResult::json(&json!({ "cog_id": cog_id, "cascade": cascade }))
}

/// Executes `cog.update`.
pub fn execute_cog_update(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: CogUpdateArgs = parse_args(arguments)?;
    let cascade = runtime.system.update_cog(&args.cog_id, &args.fields)?;
    let version = runtime.system.cog(&args.cog_id).map(|cog| cog.version);
    ToolResult::json(&json!({
        "cog_id": args.cog_id,
        "version": version,
        "cascade": cascade,
    }))
}

/// Executes `cog.compose`.
pub fn execute_cog_compose(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: ComposeArgs = parse_args(arguments)?;
    let mut request = ComposeRequest::new(args.cog_ids, args.new_cog_id)
        .with_lineage_meta("manager_service", runtime.scope.manager_service.clone())
        .with_lineage_meta("workspace_id", runtime.scope.workspace_id.clone());
    if let Some(theme) = args.theme {
        request = request.with_theme(theme);
    }
    if let Some(graph_id) = args.graph_id {
        request = request.with_placement(graph_id, placement_bucket(args.bucket.as_deref())?);
    }

    let outcome = runtime.system.compose(&request)?;
    ToolResult::json(&outcome)
}

/// Executes `cog.split`.
pub fn execute_cog_split(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: SplitArgs = parse_args(arguments)?;
    let mode = SplitMode::parse(&args.mode)?;
    let mut request = SplitRequest::new(args.cog_id, mode)
        .with_lineage_meta("manager_service", runtime.scope.manager_service.clone())
        .with_lineage_meta("workspace_id", runtime.scope.workspace_id.clone());
    if let Some(prefix) = args.new_cog_prefix {
        request = request.with_prefix(prefix);
    }
    if let Some(max_items) = args.max_items {
        request = request.with_max_items(max_items);
    }
    if let Some(graph_id) = args.graph_id {
        request = request.with_placement(graph_id, placement_bucket(args.bucket.as_deref())?);
    }

    let outcome = runtime.system.split(&request)?;
    ToolResult::json(&outcome)
}
