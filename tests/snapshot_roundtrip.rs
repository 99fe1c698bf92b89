//! Snapshot persistence tests.
//!
//! Saves a system that has been reordered, composed and split, loads it back
//! and checks the document survives field by field.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use cogmesh::JsonSnapshotStore;
use cogmesh::models::{Bucket, Metadata, OpType};
use cogmesh::services::{
    CogSystem, ComposeRequest, IterationEngine, SAMPLE_GRAPH_ID, SplitMode, SplitRequest,
    sample_policy, sample_system,
};
use tempfile::TempDir;

fn evolved_system() -> CogSystem {
    let mut system = sample_system().unwrap();
    let policy = sample_policy();
    system.bind_graph_policy(SAMPLE_GRAPH_ID, policy.clone()).unwrap();
    IterationEngine::new(&mut system)
        .run_auto(SAMPLE_GRAPH_ID, &policy, 2, true)
        .unwrap();
    system
        .compose(&ComposeRequest::new(["A", "B"], "AB").with_placement(SAMPLE_GRAPH_ID, Bucket::Adjacent))
        .unwrap();
    system
        .split(&SplitRequest::new("C", SplitMode::Chars).with_max_items(3))
        .unwrap();
    system
}

#[test]
fn test_save_then_load_is_identical() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("demo-1.json");
    let system = evolved_system();

    let mut meta = Metadata::new();
    meta.insert("purpose".to_string(), "iteration baseline".into());
    let snapshot = system.snapshot("demo-1", Some(meta));
    JsonSnapshotStore::save(&path, &snapshot).unwrap();

    let loaded = JsonSnapshotStore::load(&path).unwrap();
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.meta["purpose"], "iteration baseline");
}

#[test]
fn test_loaded_state_replaces_system_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    let original = evolved_system();
    JsonSnapshotStore::save(&path, &original.snapshot("s", None)).unwrap();

    let mut fresh = sample_system().unwrap();
    fresh.bind_graph_policy(SAMPLE_GRAPH_ID, sample_policy()).unwrap();
    fresh.load_snapshot(&JsonSnapshotStore::load(&path).unwrap(), true);

    assert!(fresh.graph_policy(SAMPLE_GRAPH_ID).is_none());
    assert_eq!(fresh.counts()["cogs"], original.counts()["cogs"]);
    assert_eq!(fresh.graph(SAMPLE_GRAPH_ID), original.graph(SAMPLE_GRAPH_ID));
    assert_eq!(fresh.lineage(), original.lineage());
    assert!(fresh.lineage().iter().any(|op| op.op_type == OpType::Split));
}

#[test]
fn test_document_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shape.json");
    let mut system = evolved_system();
    system.set_hidden_layers(SAMPLE_GRAPH_ID, [3, 1].into_iter().collect()).unwrap();
    JsonSnapshotStore::save(&path, &system.snapshot("shape", None)).unwrap();

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    for key in ["id", "created_at", "meta", "cogs", "components", "graphs", "score_sets", "lineage"] {
        assert!(document.get(key).is_some(), "missing {key}");
    }
    assert!(document["cogs"]["A"].is_object());
    assert!(document["score_sets"]["SS-X"]["entries"].is_array());
    assert!(document["score_sets"]["SS-X"].get("cog_ids").is_none());
    assert_eq!(document["graphs"]["G1"]["hidden_layers"], serde_json::json!([1, 3]));
}
