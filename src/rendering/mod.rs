//! Plain-text views of graphs, neighbor rankings and chains.

use crate::models::DirectionMode;
use crate::services::{ChainResult, CogSystem};
use crate::{Error, Result};
use std::fmt::Write as _;

/// Renders system state as fixed-layout text.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiRenderer;

impl AsciiRenderer {
    /// One line per node in traversal order, with components indented below.
    ///
    /// ```text
    /// CogGraph g
    ///   Base: a
    ///   Hidden layers: []
    ///
    /// [B] Layer 00 | Cog a | theme=finance breadth=0.700 depth=1.000 volume=3.000
    ///       - c1 (text)
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown graph.
    pub fn render_graph(system: &CogSystem, graph_id: &str, show_components: bool) -> Result<String> {
        let graph = system
            .graph(graph_id)
            .ok_or_else(|| Error::unknown("graph", graph_id))?;
        let hidden: Vec<i64> = graph.hidden_layers.iter().copied().collect();

        let mut out = String::new();
        let _ = writeln!(out, "CogGraph {}", graph.id);
        let _ = writeln!(out, "  Base: {}", graph.base_cog_id);
        let _ = writeln!(out, "  Hidden layers: {hidden:?}");
        out.push('\n');

        for node in graph.nodes() {
            let tag = node.role.tag();
            let Some(cog) = system.cog(node.cog_id.as_str()) else {
                let _ = writeln!(out, "[{tag}] Layer {:02} | Cog {} (missing)", node.layer, node.cog_id);
                continue;
            };
            let _ = writeln!(
                out,
                "[{tag}] Layer {:02} | Cog {} | theme={} breadth={:.3} depth={:.3} volume={:.3}",
                node.layer, cog.id, cog.theme, cog.breadth, cog.depth, cog.volume
            );
            if show_components {
                for component_id in &cog.component_ids {
                    match system.component(component_id) {
                        Some(component) => {
                            let _ = writeln!(out, "      - {} ({})", component.id, component.kind);
                        },
                        None => {
                            let _ = writeln!(out, "      - {component_id} (missing)");
                        },
                    }
                }
            }
        }
        Ok(out.trim_end().to_string())
    }

    /// Every graph member followed by its ranked neighbors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown graph or score set.
    pub fn render_similarity(
        system: &mut CogSystem,
        graph_id: &str,
        score_set_id: &str,
        mode: DirectionMode,
    ) -> Result<String> {
        let ids = system
            .graph(graph_id)
            .ok_or_else(|| Error::unknown("graph", graph_id))?
            .ordered_ids();
        let index = system.neighbor_index(score_set_id, mode)?;

        let mut out = format!("Similarity view score_set={score_set_id} mode={mode}");
        for id in ids {
            let formatted: Vec<String> = index
                .neighbors(id.as_str())
                .iter()
                .map(|n| format!("{}:{:.3}", n.to_cog_id, n.score))
                .collect();
            let _ = write!(out, "\n  {id} -> [{}]", formatted.join(", "));
        }
        Ok(out)
    }

    /// The chain as `a -> b -> c`.
    #[must_use]
    pub fn render_chain(result: &ChainResult) -> String {
        if result.chain.is_empty() {
            return format!("Iteration result graph={}: <empty chain>", result.graph_id);
        }
        let ids: Vec<&str> = result.chain.iter().map(|id| id.as_str()).collect();
        format!("Iteration result graph={}: {}", result.graph_id, ids.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cog, CogGraph, CogId, Component};
    use crate::scoring::WeightedFeatureStrategy;
    use std::sync::Arc;

    fn system() -> CogSystem {
        let mut system = CogSystem::new();
        system.add_component(Component::new("c1", "text"));
        system
            .add_cog(Cog::new("a", "finance").with_core(0.7, 1.0, 3.0).with_component("c1").with_component("gone"))
            .unwrap();
        system.add_cog(Cog::new("b", "finance").with_core(0.69, 1.0, 3.0)).unwrap();
        system
            .add_graph(CogGraph::new("g", "a").with_layered(["b"]).with_hidden_layers([1]))
            .unwrap();
        system
    }

    #[test]
    fn test_render_graph() {
        let text = AsciiRenderer::render_graph(&system(), "g", true).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "CogGraph g");
        assert_eq!(lines[1], "  Base: a");
        assert_eq!(lines[2], "  Hidden layers: [1]");
        assert_eq!(
            lines[4],
            "[B] Layer 00 | Cog a | theme=finance breadth=0.700 depth=1.000 volume=3.000"
        );
        assert_eq!(lines[5], "      - c1 (text)");
        assert_eq!(lines[6], "      - gone (missing)");
        assert!(lines[7].starts_with("[L] Layer 01 | Cog b"));

        let compact = AsciiRenderer::render_graph(&system(), "g", false).unwrap();
        assert_eq!(compact.lines().count(), 6);
        assert!(AsciiRenderer::render_graph(&system(), "nope", true).is_err());
    }

    #[test]
    fn test_render_similarity() {
        let mut system = system();
        system.register_strategy(Arc::new(WeightedFeatureStrategy::new("w")));
        system.create_score_set("ss", "w", "ctx", None).unwrap();
        let text =
            AsciiRenderer::render_similarity(&mut system, "g", "ss", DirectionMode::Directed).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Similarity view score_set=ss mode=directed");
        assert!(lines[1].starts_with("  a -> [b:"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_render_chain() {
        let mut result = ChainResult {
            graph_id: "g".to_string(),
            ..ChainResult::default()
        };
        assert_eq!(AsciiRenderer::render_chain(&result), "Iteration result graph=g: <empty chain>");
        result.chain = vec![CogId::new("a"), CogId::new("b")];
        assert_eq!(AsciiRenderer::render_chain(&result), "Iteration result graph=g: a -> b");
    }
}
