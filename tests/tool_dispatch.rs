//! Tool surface end-to-end tests.
//!
//! Runs JSON tool calls through a [`ToolDispatcher`] rooted in a temporary
//! data directory, the way the `run` command does.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use cogmesh::config::CogmeshConfig;
use cogmesh::{Error, ToolDispatcher};
use serde_json::{Value, json};
use tempfile::TempDir;

fn dispatcher(dir: &TempDir) -> ToolDispatcher {
    ToolDispatcher::new(&CogmeshConfig::new().with_data_root(dir.path()))
}

fn call(dispatcher: &mut ToolDispatcher, tool: &str, arguments: Value) -> Value {
    let result = dispatcher.dispatch(tool, arguments).unwrap();
    assert!(!result.is_error);
    serde_json::from_str(result.first_text().unwrap()).unwrap()
}

fn seed(dispatcher: &mut ToolDispatcher) {
    call(
        dispatcher,
        "strategy.register_preset",
        json!({"preset_id": "aggregate_common", "strategy_id": "w"}),
    );
    for (id, content) in [("a", "ledger"), ("b", "ledgers"), ("c", "zebra")] {
        call(dispatcher, "cog.add", json!({"id": id, "theme": "finance", "content": content}));
    }
    call(dispatcher, "score_set.create", json!({"score_set_id": "ss", "strategy_id": "w"}));
    call(
        dispatcher,
        "graph.create",
        json!({"graph_id": "g", "base_cog_id": "a", "adjacent": ["c", "b"]}),
    );
}

#[test]
fn test_build_chain_with_bound_policy() {
    let dir = TempDir::new().unwrap();
    let mut dispatcher = dispatcher(&dir);
    seed(&mut dispatcher);

    call(
        &mut dispatcher,
        "graph.bind_policy",
        json!({"graph_id": "g", "policy": {"strategy_id": "w", "score_set_id": "ss", "max_depth": 3}}),
    );
    let chain = call(&mut dispatcher, "iteration.build_chain", json!({"graph_id": "g"}));
    assert_eq!(chain["result"]["chain"][0], "a");
    assert_eq!(chain["result"]["chain"].as_array().unwrap().len(), 3);
    assert!(chain["rendered"].as_str().unwrap().starts_with("Iteration result graph=g: a -> "));

    let neighbors = call(
        &mut dispatcher,
        "index.neighbors",
        json!({"score_set_id": "ss", "cog_id": "a", "limit": 1}),
    );
    assert_eq!(neighbors["neighbors"].as_array().unwrap().len(), 1);
    assert_eq!(neighbors["direction_mode"], "directed");
}

#[test]
fn test_snapshot_save_and_load_within_workspace() {
    let dir = TempDir::new().unwrap();
    let mut dispatcher = dispatcher(&dir);
    seed(&mut dispatcher);

    let saved = call(&mut dispatcher, "snapshot.save", json!({"snapshot_id": "s1"}));
    assert_eq!(saved["counts"]["cogs"], 3);
    assert!(dir.path().join("cogmesh/default/snapshots/s1.json").is_file());

    call(&mut dispatcher, "cog.add", json!({"id": "d"}));
    let loaded = call(&mut dispatcher, "snapshot.load", json!({"path": "snapshots/s1.json"}));
    assert_eq!(loaded["snapshot_id"], "s1");
    assert_eq!(loaded["counts"]["cogs"], 3);

    let info = call(&mut dispatcher, "runtime.info", json!({}));
    assert_eq!(info["active_snapshot_id"], "s1");
}

#[test]
fn test_snapshot_paths_cannot_escape_storage_root() {
    let dir = TempDir::new().unwrap();
    let mut dispatcher = dispatcher(&dir);

    for path in ["../other/s.json", "/etc/passwd", "snapshots/../../x.json"] {
        let err = dispatcher
            .dispatch("snapshot.save", json!({"snapshot_id": "s", "path": path}))
            .unwrap_err();
        assert!(matches!(err, Error::PathViolation { .. }), "{path}");
    }
    let err = dispatcher
        .dispatch("snapshot.save", json!({"snapshot_id": "../s"}))
        .unwrap_err();
    assert!(matches!(err, Error::PathViolation { .. }));
}

#[test]
fn test_workspaces_are_isolated() {
    let dir = TempDir::new().unwrap();
    let mut dispatcher = dispatcher(&dir);
    seed(&mut dispatcher);

    let other = call(
        &mut dispatcher,
        "runtime.info",
        json!({"manager_service": "ops", "workspace_id": "w2"}),
    );
    assert_eq!(other["counts"]["cogs"], 0);
    assert!(other["storage_root"].as_str().unwrap().ends_with("w2"));
}

#[test]
fn test_compose_and_split_through_tools() {
    let dir = TempDir::new().unwrap();
    let mut dispatcher = dispatcher(&dir);
    seed(&mut dispatcher);

    let composed = call(
        &mut dispatcher,
        "cog.compose",
        json!({"cog_ids": ["a", "c"], "new_cog_id": "ac", "graph_id": "g", "bucket": "adjacent"}),
    );
    assert_eq!(composed["theme"], "finance");

    let split = call(
        &mut dispatcher,
        "cog.split",
        json!({"cog_id": "ac", "new_cog_prefix": "part", "graph_id": "g"}),
    );
    assert_eq!(split["created_cog_ids"], json!(["part_1", "part_2"]));
    assert_eq!(split["mode"], "words");

    let rendered = dispatcher
        .dispatch("render.graph", json!({"graph_id": "g", "score_set_id": "ss"}))
        .unwrap();
    let text = rendered.first_text().unwrap();
    assert!(text.contains("Cog part_2"));
    assert!(text.contains("Similarity view score_set=ss mode=directed"));
}

#[test]
fn test_argument_errors() {
    let dir = TempDir::new().unwrap();
    let mut dispatcher = dispatcher(&dir);
    seed(&mut dispatcher);

    assert!(matches!(
        dispatcher.dispatch("cog.compose", json!({"cog_ids": ["a"], "new_cog_id": "x"})),
        Err(Error::PreconditionFailed(_))
    ));
    assert!(matches!(
        dispatcher.dispatch("cog.split", json!({"cog_id": "a", "mode": "sentences"})),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        dispatcher.dispatch("graph.swap_buckets", json!({"graph_id": "g", "force": true})),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        dispatcher.dispatch("cog.update", json!({"cog_id": "a", "fields": {"version": 9}})),
        Err(Error::UnsupportedField { .. })
    ));
    assert!(matches!(
        dispatcher.dispatch("graph.set_base", json!({"graph_id": "g", "base_cog_id": "zz"})),
        Err(Error::PreconditionFailed(_))
    ));
}

#[test]
fn test_run_auto_rejects_unbounded_iterations() {
    let dir = TempDir::new().unwrap();
    let mut dispatcher = dispatcher(&dir);
    seed(&mut dispatcher);

    let result = dispatcher.call(
        "iteration.run_auto",
        json!({
            "graph_id": "g",
            "iterations": u64::MAX,
            "policy": {"strategy_id": "w", "score_set_id": "ss", "max_depth": 2}
        }),
    );
    assert!(result.is_error);
    assert!(result.first_text().unwrap().contains("iterations"));

    let info = call(&mut dispatcher, "runtime.info", json!({}));
    assert_eq!(info["counts"]["graphs"], 1);
    let runs = call(
        &mut dispatcher,
        "iteration.run_auto",
        json!({
            "graph_id": "g",
            "iterations": 2,
            "policy": {"strategy_id": "w", "score_set_id": "ss", "max_depth": 2}
        }),
    );
    assert_eq!(runs["results"].as_array().unwrap().len(), 2);
}
