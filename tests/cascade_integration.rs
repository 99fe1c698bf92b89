//! Cascade integration tests.
//!
//! Drives a [`CogSystem`] through cog mutations and checks that score sets,
//! cached indices and bound graphs follow:
//! - closer breadth ranks first in the directed index
//! - an update rescores each affected set once and reorders bound graphs
//! - subset score sets ignore non-members; open sets absorb new cogs
//! - the sample system chain and the split scenario

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use cogmesh::models::{Cog, CogGraph, CogId, DIRECTIONAL_BIAS, DirectionMode, Metadata, PathPolicy};
use cogmesh::services::{
    CogSystem, IterationEngine, SAMPLE_GRAPH_ID, SplitMode, SplitRequest, sample_policy,
    sample_system,
};
use cogmesh::{Error, WeightedFeatureStrategy};
use serde_json::json;
use std::sync::Arc;

fn breadth_system() -> CogSystem {
    let mut system = CogSystem::new();
    system.register_strategy(Arc::new(
        WeightedFeatureStrategy::new("w")
            .with_feature_weight("core.depth", 0.0)
            .with_feature_weight("core.volume", 0.0),
    ));
    for (id, breadth) in [("A", 0.70), ("B", 0.69), ("C", 0.40)] {
        system
            .add_cog(Cog::new(id, "t").with_core(breadth, 0.0, 0.0))
            .unwrap();
    }
    system
}

fn ids(list: &[CogId]) -> Vec<&str> {
    list.iter().map(CogId::as_str).collect()
}

fn fields(value: serde_json::Value) -> Metadata {
    value.as_object().unwrap().clone()
}

#[test]
fn test_closer_breadth_ranks_first() {
    let mut system = breadth_system();
    system.create_score_set("ss", "w", "", None).unwrap();

    let set = system.score_set("ss").unwrap();
    assert!(set.get("A", "B").unwrap().score > set.get("A", "C").unwrap().score);

    let index = system.neighbor_index("ss", DirectionMode::Directed).unwrap();
    let neighbors = index.neighbors("A");
    let order: Vec<&str> = neighbors
        .iter()
        .map(|n| n.to_cog_id.as_str())
        .collect();
    assert_eq!(order, ["B", "C"]);
}

#[test]
fn test_update_cascades_to_bound_graph() {
    let mut system = breadth_system();
    system.create_score_set("ss", "w", "", None).unwrap();
    system
        .add_graph(CogGraph::new("g", "A").with_adjacent(["B", "C"]))
        .unwrap();
    system
        .bind_graph_policy("g", PathPolicy::new("w", "ss"))
        .unwrap();
    system.neighbor_index("ss", DirectionMode::Directed).unwrap();
    assert!(system.has_cached_index("ss", DirectionMode::Directed));

    let report = system
        .update_cog("C", &fields(json!({"breadth": 0.699})))
        .unwrap();

    assert_eq!(report.score_sets_rescored, ["ss"]);
    assert_eq!(report.graphs_reordered, ["g"]);
    assert_eq!(report.pairs_rescored, 4);
    assert_eq!(system.score_set("ss").unwrap().version, 2);
    assert!(!system.has_cached_index("ss", DirectionMode::Directed));
    assert_eq!(ids(&system.graph("g").unwrap().adjacent_order), ["C", "B"]);
    assert_eq!(system.cog("C").unwrap().version, 2);
}

#[test]
fn test_load_keeps_only_bindings_present_in_snapshot() {
    let mut system = breadth_system();
    system.create_score_set("ss", "w", "", None).unwrap();
    system
        .add_graph(CogGraph::new("kept", "A").with_adjacent(["B", "C"]))
        .unwrap();
    let without_g = system.snapshot("before-g", None);

    system
        .add_graph(CogGraph::new("g", "A").with_layered(["C", "B"]))
        .unwrap();
    system.bind_graph_policy("g", PathPolicy::new("w", "ss")).unwrap();
    system.bind_graph_policy("kept", PathPolicy::new("w", "ss")).unwrap();

    system.load_snapshot(&without_g, false);
    assert!(system.graph_policy("g").is_none());
    assert!(system.graph_policy("kept").is_some());

    let report = system
        .update_cog("A", &fields(json!({"theme": "x"})))
        .unwrap();
    assert_eq!(report.score_sets_rescored, ["ss"]);
    assert_eq!(report.graphs_reordered, ["kept"]);
    assert!(report.graphs_skipped.is_empty());
}

#[test]
fn test_subset_score_set_is_closed() {
    let mut system = breadth_system();
    system
        .create_score_set("sub", "w", "", Some(&[CogId::new("A"), CogId::new("B")]))
        .unwrap();

    let report = system
        .update_cog("C", &fields(json!({"breadth": 0.1})))
        .unwrap();
    assert!(report.is_quiet());
    assert_eq!(system.score_set("sub").unwrap().version, 1);

    let report = system
        .update_cog("A", &fields(json!({"theme": "other"})))
        .unwrap();
    assert_eq!(report.score_sets_rescored, ["sub"]);
    let set = system.score_set("sub").unwrap();
    assert_eq!(set.version, 2);
    assert_eq!(set.entries.len(), 2);
    assert!(set.get("A", "C").is_none());
}

#[test]
fn test_open_score_set_absorbs_new_cogs() {
    let mut system = breadth_system();
    system.create_score_set("ss", "w", "", None).unwrap();

    let report = system
        .add_cog(Cog::new("D", "t").with_core(0.5, 0.0, 0.0))
        .unwrap();
    assert_eq!(report.pairs_rescored, 6);

    let set = system.score_set("ss").unwrap();
    assert_eq!(set.entries.len(), 12);
    assert!(set.get("D", "A").is_some());
    assert!(set.get("A", "D").is_some());
}

#[test]
fn test_failed_update_leaves_state_untouched() {
    let mut system = breadth_system();
    system.create_score_set("ss", "w", "", None).unwrap();

    let err = system
        .update_cog("A", &fields(json!({"breadth": 0.1, "id": "Z"})))
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedField { .. }));
    let a = system.cog("A").unwrap();
    assert!((a.breadth - 0.70).abs() < f64::EPSILON);
    assert_eq!(a.version, 1);
    assert_eq!(system.score_set("ss").unwrap().version, 1);
}

#[test]
fn test_chain_stops_at_max_depth() {
    let mut system = breadth_system();
    system.create_score_set("ss", "w", "", None).unwrap();
    system
        .add_graph(CogGraph::new("g", "A").with_adjacent(["B"]).with_layered(["C"]))
        .unwrap();

    let policy = PathPolicy::new("w", "ss").with_max_depth(2);
    let result = IterationEngine::new(&mut system)
        .build_chain("g", &policy, None, None)
        .unwrap();
    assert_eq!(ids(&result.chain), ["A", "B"]);
}

#[test]
fn test_sample_system_walkthrough() {
    let mut system = sample_system().unwrap();
    let policy = sample_policy();
    system.bind_graph_policy(SAMPLE_GRAPH_ID, policy.clone()).unwrap();

    let result = IterationEngine::new(&mut system)
        .build_chain(SAMPLE_GRAPH_ID, &policy, None, None)
        .unwrap();
    assert_eq!(result.chain.len(), 3);
    assert_eq!(result.chain[0].as_str(), "A");

    let report = system
        .update_cog("C", &fields(json!({"content": "invoicing pipeline"})))
        .unwrap();
    assert_eq!(report.graphs_reordered, [SAMPLE_GRAPH_ID]);
}

#[test]
fn test_split_words_inherits_bias() {
    let mut system = CogSystem::new();
    system.register_default_word_feature_techniques();
    system
        .add_cog(
            Cog::new("C", "Invoicing")
                .with_content("invoicing pipeline")
                .with_feature(DIRECTIONAL_BIAS, -0.05),
        )
        .unwrap();

    let outcome = system
        .split(&SplitRequest::new("C", SplitMode::Words))
        .unwrap();
    assert_eq!(ids(&outcome.created_cog_ids), ["C_split_1", "C_split_2"]);

    let first = system.cog("C_split_1").unwrap();
    assert_eq!(first.content, "invoicing");
    assert_eq!(system.cog("C_split_2").unwrap().content, "pipeline");
    assert!((first.feature(DIRECTIONAL_BIAS) + 0.05).abs() < f64::EPSILON);
    assert_eq!(first.theme, "Invoicing");
}
