//! A small payments system used by the CLI demo and the integration tests.

use super::system::CogSystem;
use crate::models::{Cog, CogGraph, Component, DIRECTIONAL_BIAS, DirectionMode, PathPolicy};
use crate::Result;

/// Strategy registered by [`sample_system`].
pub const SAMPLE_STRATEGY_ID: &str = "X";
/// Score set created by [`sample_system`].
pub const SAMPLE_SCORE_SET_ID: &str = "SS-X";
/// Graph created by [`sample_system`].
pub const SAMPLE_GRAPH_ID: &str = "G1";

fn sample_cog(id: &str, theme: &str, content: &str, bias: f64, with_shape: bool) -> Cog {
    let mut cog = Cog::new(id, theme)
        .with_content(content)
        .with_feature(DIRECTIONAL_BIAS, bias)
        .with_technique("core", "breadth", "alpha_polar_breadth")
        .with_technique("core", "depth", "letter_depth")
        .with_technique("core", "volume", "letter_volume");
    if with_shape {
        cog = cog
            .with_technique("shape", "unique_letters", "shape_unique_letters")
            .with_technique("shape", "vowel_ratio", "shape_vowel_ratio");
    }
    cog
}

/// Builds three cogs `A`, `B`, `C` in graph `G1` (base `A`, `B` adjacent,
/// `C` layered) scored into `SS-X` with the `shape_aware_per_namespace` preset.
///
/// # Errors
///
/// Returns an error only if the built-in preset or plugin catalog changes.
pub fn sample_system() -> Result<CogSystem> {
    let mut system = CogSystem::new();
    system.register_weighted_strategy_preset("shape_aware_per_namespace", Some(SAMPLE_STRATEGY_ID), None)?;
    system.register_default_word_feature_techniques();
    system.register_feature_plugin("shape", false)?;

    for (id, kind) in [("cA1", "rule"), ("cA2", "data"), ("cB1", "model"), ("cC1", "rule")] {
        system.add_component(Component::new(id, kind));
    }
    system.add_cog(
        sample_cog("A", "Payments", "payments", 0.10, true)
            .with_component("cA1")
            .with_component("cA2"),
    )?;
    system.add_cog(sample_cog("B", "Settlement", "settlement", 0.0, true).with_component("cB1"))?;
    system.add_cog(sample_cog("C", "Invoicing", "invoicing", -0.05, false).with_component("cC1"))?;

    system.add_graph(
        CogGraph::new(SAMPLE_GRAPH_ID, "A")
            .with_adjacent(["B"])
            .with_layered(["C"]),
    )?;
    system.create_score_set(SAMPLE_SCORE_SET_ID, SAMPLE_STRATEGY_ID, "", None)?;
    Ok(system)
}

/// The policy the demo binds to `G1`.
#[must_use]
pub fn sample_policy() -> PathPolicy {
    PathPolicy::new(SAMPLE_STRATEGY_ID, SAMPLE_SCORE_SET_ID)
        .with_direction_mode(DirectionMode::Directed)
        .with_group_range(0.10)
        .with_max_depth(4)
}
