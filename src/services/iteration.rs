//! Graph traversal over neighbor indices.

use super::system::CogSystem;
use crate::index::Neighbor;
use crate::models::{CogGraph, CogId, PathPolicy};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::instrument;

/// Upper bound on the rounds [`IterationEngine::run_auto`] accepts in one call.
pub const MAX_AUTO_ITERATIONS: usize = 1_000;

/// One chain built by [`IterationEngine::build_chain`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainResult {
    /// The traversed graph.
    pub graph_id: String,
    /// Visited cogs in order.
    pub chain: Vec<CogId>,
    /// Near-equal neighbors gathered at each step when grouping is enabled.
    pub grouped_neighbors: BTreeMap<CogId, Vec<CogId>>,
    /// Free-form annotations such as the `iteration` number.
    pub metadata: BTreeMap<String, String>,
}

/// Runs reorders and greedy walks against a borrowed [`CogSystem`].
#[derive(Debug)]
pub struct IterationEngine<'a> {
    system: &'a mut CogSystem,
}

impl<'a> IterationEngine<'a> {
    /// Creates an engine over `system`.
    pub const fn new(system: &'a mut CogSystem) -> Self {
        Self { system }
    }

    /// The underlying system.
    #[must_use]
    pub const fn system(&self) -> &CogSystem {
        self.system
    }

    /// Graph nodes a walk may visit under `policy`.
    fn allowed_nodes(graph: &CogGraph, policy: &PathPolicy) -> BTreeSet<CogId> {
        graph
            .nodes()
            .into_iter()
            .filter(|node| policy.include_hidden_layers || !graph.hidden_layers.contains(&node.layer))
            .map(|node| node.cog_id)
            .collect()
    }

    /// Reorders the graph buckets by similarity to its base.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownReference`](crate::Error::UnknownReference) for an unknown graph or score set.
    pub fn reorder_graph(&mut self, graph_id: &str, policy: &PathPolicy) -> Result<()> {
        self.system.reorder_graph(graph_id, policy).map(|_| ())
    }

    /// Walks greedily from `start` (default: the base) to the best unvisited
    /// neighbor until nothing qualifies or the chain reaches `max_depth`.
    ///
    /// The start joins the chain only when it is allowed. Without
    /// `unseen_only` and without `max_depth`, the chain length is capped at
    /// the number of allowed nodes.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownReference`](crate::Error::UnknownReference) for an unknown graph, start cog or
    /// score set.
    #[instrument(skip(self, policy, initial_seen), fields(graph_id = %graph_id, score_set_id = %policy.score_set_id))]
    pub fn build_chain(
        &mut self,
        graph_id: &str,
        policy: &PathPolicy,
        start: Option<&str>,
        initial_seen: Option<&BTreeSet<CogId>>,
    ) -> Result<ChainResult> {
        let graph = self.system.require_graph(graph_id)?;
        let start = start.map_or_else(|| graph.base_cog_id.clone(), CogId::from);
        let allowed = Self::allowed_nodes(graph, policy);
        self.system.require_cog(start.as_str())?;
        let index = self
            .system
            .neighbor_index(&policy.score_set_id, policy.direction_mode)?;

        let limit = policy
            .max_depth
            .or_else(|| (!policy.unseen_only).then_some(allowed.len()));
        let mut seen = initial_seen.cloned().unwrap_or_default();
        let no_seen = BTreeSet::new();
        let mut result = ChainResult {
            graph_id: graph_id.to_string(),
            ..ChainResult::default()
        };

        if allowed.contains(&start) {
            result.chain.push(start.clone());
            seen.insert(start.clone());
        }

        let mut current = start;
        let mut depth = 1;
        loop {
            if limit.is_some_and(|max| depth >= max) {
                break;
            }
            let exclude = if policy.unseen_only { &seen } else { &no_seen };
            let selected: Neighbor = if let Some(range) = policy.group_range {
                let group = index.range_group(
                    current.as_str(),
                    range,
                    exclude,
                    policy.min_score,
                    Some(&allowed),
                );
                let Some(first) = group.first().cloned() else {
                    break;
                };
                result.grouped_neighbors.insert(
                    current.clone(),
                    group.into_iter().map(|n| n.to_cog_id).collect(),
                );
                first
            } else {
                match index.top_unseen(current.as_str(), exclude, policy.min_score, Some(&allowed)) {
                    Some(neighbor) => neighbor,
                    None => break,
                }
            };

            result.chain.push(selected.to_cog_id.clone());
            seen.insert(selected.to_cog_id.clone());
            current = selected.to_cog_id;
            depth += 1;
        }

        tracing::debug!(length = result.chain.len(), "Built chain");
        Ok(result)
    }

    /// Repeats reorder and [`Self::build_chain`] `iterations` times. With
    /// `advance_base`, the chain's second element becomes the base before the
    /// next iteration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `iterations` exceeds
    /// [`MAX_AUTO_ITERATIONS`], otherwise the first error of any step.
    pub fn run_auto(
        &mut self,
        graph_id: &str,
        policy: &PathPolicy,
        iterations: usize,
        advance_base: bool,
    ) -> Result<Vec<ChainResult>> {
        if iterations > MAX_AUTO_ITERATIONS {
            return Err(Error::InvalidInput(format!(
                "iterations must be at most {MAX_AUTO_ITERATIONS}, got {iterations}"
            )));
        }
        let mut results = Vec::new();
        for step in 1..=iterations {
            self.reorder_graph(graph_id, policy)?;
            let mut result = self.build_chain(graph_id, policy, None, None)?;
            result
                .metadata
                .insert("iteration".to_string(), step.to_string());
            if advance_base && let Some(next) = result.chain.get(1) {
                self.system.set_graph_base(graph_id, next.as_str())?;
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Neighbors of `from` scoring within `equivalence_epsilon` of the best
    /// qualifying one.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownReference`](crate::Error::UnknownReference) for an unknown score set.
    pub fn equivalent_group(
        &mut self,
        from: &str,
        policy: &PathPolicy,
        seen: Option<&BTreeSet<CogId>>,
        allowed: Option<&BTreeSet<CogId>>,
    ) -> Result<Vec<Neighbor>> {
        let index = self
            .system
            .neighbor_index(&policy.score_set_id, policy.direction_mode)?;
        let empty = BTreeSet::new();
        Ok(index.range_group(
            from,
            policy.equivalence_epsilon,
            seen.unwrap_or(&empty),
            policy.min_score,
            allowed,
        ))
    }

    /// Reorders one graph on request.
    ///
    /// # Errors
    ///
    /// See [`CogSystem::reorder_graph`].
    pub fn run_manual_reorder(&mut self, graph_id: &str, policy: &PathPolicy) -> Result<()> {
        self.reorder_graph(graph_id, policy)
    }

    /// Swaps the buckets of one graph on request.
    ///
    /// # Errors
    ///
    /// See [`CogSystem::swap_adjacent_layered`].
    pub fn run_manual_swap(&mut self, graph_id: &str) -> Result<()> {
        self.system.swap_adjacent_layered(graph_id).map(|_| ())
    }

    /// Moves the base, then reorders.
    ///
    /// # Errors
    ///
    /// See [`CogSystem::set_graph_base`] and [`CogSystem::reorder_graph`].
    pub fn run_manual_set_base(
        &mut self,
        graph_id: &str,
        new_base: &str,
        policy: &PathPolicy,
    ) -> Result<()> {
        self.system.set_graph_base(graph_id, new_base)?;
        self.reorder_graph(graph_id, policy)
    }
}
