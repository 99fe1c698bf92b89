//! Workspace-level handlers: runtime info, strategy and plugin registration,
//! snapshots.

use crate::mcp::runtime::WorkspaceRuntime;
use crate::mcp::tool_types::{
    NoArgs, RegisterFeaturePluginArgs, RegisterPresetArgs, SnapshotLoadArgs, SnapshotSaveArgs,
    parse_args,
};
use crate::security::{is_safe_segment, resolve_within_root};
use crate::storage::JsonSnapshotStore;
use crate::{Error, Result};
use serde_json::{Value, json};

use super::super::ToolResult;

/// Executes `runtime.info`.
pub fn execute_runtime_info(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let _: NoArgs = parse_args(arguments)?;
    ToolResult::json(&json!({
        "manager_service": runtime.scope.manager_service,
        "workspace_id": runtime.scope.workspace_id,
        "storage_root": runtime.storage_root.display().to_string(),
        "active_snapshot_id": runtime.active_snapshot_id,
        "counts": runtime.system.counts(),
    }))
}

/// Executes `strategy.presets`.
pub fn execute_strategy_presets(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let _: NoArgs = parse_args(arguments)?;
    ToolResult::json(&runtime.system.available_strategy_presets())
}

/// Executes `strategy.register_preset`.
pub fn execute_register_preset(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: RegisterPresetArgs = parse_args(arguments)?;
    let strategy_id = runtime.system.register_weighted_strategy_preset(
        &args.preset_id,
        Some(&args.strategy_id),
        args.overrides.as_ref(),
    )?;
    ToolResult::json(&json!({
        "preset_id": args.preset_id,
        "strategy_id": strategy_id,
    }))
}

/// Executes `plugin.register_feature`.
pub fn execute_register_feature_plugin(
    runtime: &mut WorkspaceRuntime,
    arguments: Value,
) -> Result<ToolResult> {
    let args: RegisterFeaturePluginArgs = parse_args(arguments)?;
    let technique_ids = runtime
        .system
        .register_feature_plugin(&args.plugin, args.use_as_default)?;
    ToolResult::json(&json!({
        "plugin": args.plugin,
        "use_as_default": args.use_as_default,
        "technique_ids": technique_ids,
    }))
}

/// Executes `snapshot.save`.
///
/// The file defaults to `snapshots/<snapshot_id>.json` under the storage root.
pub fn execute_snapshot_save(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: SnapshotSaveArgs = parse_args(arguments)?;
    let relative = match args.path {
        Some(path) => path,
        None if is_safe_segment(&args.snapshot_id) => format!("snapshots/{}.json", args.snapshot_id),
        None => {
            return Err(Error::PathViolation {
                path: args.snapshot_id,
                reason: "snapshot id must be a single path segment".to_string(),
            });
        },
    };
    let path = resolve_within_root(&runtime.storage_root, &relative)?;

    let snapshot = runtime.system.snapshot(&args.snapshot_id, args.meta);
    JsonSnapshotStore::save(&path, &snapshot)?;
    runtime.active_snapshot_id = Some(snapshot.id.clone());

    ToolResult::json(&json!({
        "snapshot_id": snapshot.id,
        "path": path.display().to_string(),
        "counts": snapshot.counts(),
    }))
}

/// Executes `snapshot.load`.
pub fn execute_snapshot_load(runtime: &mut WorkspaceRuntime, arguments: Value) -> Result<ToolResult> {
    let args: SnapshotLoadArgs = parse_args(arguments)?;
    let path = resolve_within_root(&runtime.storage_root, &args.path)?;

    let snapshot = JsonSnapshotStore::load(&path)?;
    runtime.system.load_snapshot(&snapshot, args.reset_policies);
    runtime.active_snapshot_id = Some(snapshot.id.clone());

    ToolResult::json(&json!({
        "snapshot_id": snapshot.id,
        "reset_policies": args.reset_policies,
        "counts": runtime.system.counts(),
    }))
}
