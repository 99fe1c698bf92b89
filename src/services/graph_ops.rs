//! Graph registration and structural mutations.
//!
//! Every mutation here validates first, then changes the graph, bumps its
//! version and appends one lineage record.

use super::system::CogSystem;
use crate::models::{Bucket, CogGraph, CogId, LineageOperation, OpType, PathPolicy};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::instrument;

fn ids_to_strings(ids: &[CogId]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

impl CogSystem {
    /// Adds a graph after checking its members.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] for a known graph id and
    /// [`Error::PreconditionFailed`] when a member repeats or is not a known
    /// cog.
    pub fn add_graph(&mut self, graph: CogGraph) -> Result<()> {
        if self.graphs.contains_key(&graph.id) {
            return Err(Error::duplicate("graph", graph.id.as_str()));
        }
        if let Some(duplicate) = graph.first_duplicate() {
            return Err(Error::PreconditionFailed(format!(
                "graph '{}' lists cog '{duplicate}' more than once",
                graph.id
            )));
        }
        let missing: Vec<String> = graph
            .ordered_ids()
            .iter()
            .filter(|id| !self.cogs.contains_key(*id))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(Error::PreconditionFailed(format!(
                "graph '{}' references unknown cogs: {}",
                graph.id,
                missing.join(", ")
            )));
        }
        tracing::debug!(graph_id = %graph.id, nodes = graph.len(), "Added graph");
        self.graphs.insert(graph.id.clone(), graph);
        Ok(())
    }

    /// Binds a policy to a graph so score updates reorder it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown graph or score set
    /// and [`Error::InvalidConfiguration`] for an invalid policy.
    pub fn bind_graph_policy(&mut self, graph_id: &str, policy: PathPolicy) -> Result<()> {
        self.require_graph(graph_id)?;
        self.require_score_set(&policy.score_set_id)?;
        policy.validate()?;
        self.graph_policies.insert(graph_id.to_string(), policy);
        Ok(())
    }

    /// Sorts each bucket by descending score from the base, then id. Ids
    /// without a score from the base sort last.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown graph or score set.
    #[instrument(skip(self, policy), fields(graph_id = %graph_id, score_set_id = %policy.score_set_id))]
    pub fn reorder_graph(&mut self, graph_id: &str, policy: &PathPolicy) -> Result<&CogGraph> {
        self.require_graph(graph_id)?;
        let index = self.neighbor_index(&policy.score_set_id, policy.direction_mode)?;
        let graph = self
            .graphs
            .get_mut(graph_id)
            .ok_or_else(|| Error::unknown("graph", graph_id))?;

        let base = graph.base_cog_id.clone();
        let scores: BTreeMap<CogId, f64> = index
            .neighbors(base.as_str())
            .into_iter()
            .map(|n| (n.to_cog_id, n.score))
            .collect();
        let score_of = |id: &CogId| scores.get(id).copied().unwrap_or(f64::NEG_INFINITY);
        for bucket in [&mut graph.adjacent_order, &mut graph.layered_order] {
            bucket.sort_by(|a, b| score_of(b).total_cmp(&score_of(a)).then_with(|| a.cmp(b)));
        }
        graph.version += 1;

        let op = LineageOperation::new(
            OpType::Reorder,
            vec![base.to_string()],
            ids_to_strings(&graph.ordered_ids()),
        )
        .with_meta("graph_id", graph_id)
        .with_meta("score_set_id", policy.score_set_id.as_str())
        .with_meta("direction_mode", policy.direction_mode.as_str());
        self.lineage.push(op);
        metrics::counter!("cogmesh_graph_reorders_total").increment(1);
        self.require_graph(graph_id)
    }

    /// Exchanges the adjacent and layered buckets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown graph.
    pub fn swap_adjacent_layered(&mut self, graph_id: &str) -> Result<&CogGraph> {
        let graph = self
            .graphs
            .get_mut(graph_id)
            .ok_or_else(|| Error::unknown("graph", graph_id))?;
        std::mem::swap(&mut graph.adjacent_order, &mut graph.layered_order);
        graph.version += 1;
        let op = LineageOperation::new(
            OpType::SwapAdjacentLayered,
            Vec::new(),
            ids_to_strings(&graph.ordered_ids()),
        )
        .with_meta("graph_id", graph_id);
        self.lineage.push(op);
        self.require_graph(graph_id)
    }

    /// Moves the base to an existing member and repartitions the remaining
    /// ids in order, keeping the previous adjacent bucket size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown graph and
    /// [`Error::PreconditionFailed`] when the new base is not a member.
    pub fn set_graph_base(&mut self, graph_id: &str, new_base: &str) -> Result<&CogGraph> {
        let graph = self
            .graphs
            .get_mut(graph_id)
            .ok_or_else(|| Error::unknown("graph", graph_id))?;
        if !graph.contains(new_base) {
            return Err(Error::PreconditionFailed(format!(
                "cog '{new_base}' must already be in graph '{graph_id}' to become its base"
            )));
        }

        let mut rest: Vec<CogId> = graph
            .ordered_ids()
            .into_iter()
            .filter(|id| id.as_str() != new_base)
            .collect();
        let split = graph.adjacent_order.len().min(rest.len());
        graph.layered_order = rest.split_off(split);
        graph.adjacent_order = rest;
        graph.base_cog_id = CogId::new(new_base);
        graph.version += 1;

        let op = LineageOperation::new(
            OpType::SetBase,
            vec![new_base.to_string()],
            ids_to_strings(&graph.ordered_ids()),
        )
        .with_meta("graph_id", graph_id);
        self.lineage.push(op);
        self.require_graph(graph_id)
    }

    /// Replaces the hidden layer set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown graph.
    pub fn set_hidden_layers(&mut self, graph_id: &str, hidden_layers: BTreeSet<i64>) -> Result<&CogGraph> {
        let graph = self
            .graphs
            .get_mut(graph_id)
            .ok_or_else(|| Error::unknown("graph", graph_id))?;
        let sorted: Vec<i64> = hidden_layers.iter().copied().collect();
        graph.hidden_layers = hidden_layers;
        graph.version += 1;
        let op = LineageOperation::new(
            OpType::SetHiddenLayers,
            Vec::new(),
            ids_to_strings(&graph.ordered_ids()),
        )
        .with_meta("graph_id", graph_id)
        .with_meta("hidden_layers", sorted);
        self.lineage.push(op);
        self.require_graph(graph_id)
    }

    /// Appends `cog_id` to `bucket`, removing it from either bucket first.
    /// The base is left where it is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown graph.
    pub fn attach_to_graph(&mut self, graph_id: &str, cog_id: &CogId, bucket: Bucket) -> Result<()> {
        let graph = self
            .graphs
            .get_mut(graph_id)
            .ok_or_else(|| Error::unknown("graph", graph_id))?;
        if graph.base_cog_id == *cog_id {
            return Ok(());
        }
        graph.adjacent_order.retain(|id| id != cog_id);
        graph.layered_order.retain(|id| id != cog_id);
        graph.bucket_mut(bucket).push(cog_id.clone());
        graph.version += 1;
        Ok(())
    }
}
