//! Data models for cogmesh.
//!
//! This module contains the core data structures: cogs and their scoring
//! state, graphs, score sets, policies, lineage records and snapshots.

mod cog;
mod events;
pub mod graph;
mod lineage;
mod policy;
mod score;
mod snapshot;

pub use cog::{
    CORE_NAMESPACE, Cog, CogId, CogScoring, Component, DERIVED_FEATURE_KEYS, DIRECTIONAL_BIAS,
    Metadata, NamespacedValues, TechniqueBindings,
};
pub use events::{CascadeEvent, CascadeReport};
pub use graph::{Bucket, CogGraph, GraphNode, NodeRole};
pub use lineage::{LineageOperation, OpType};
pub use policy::{DirectionMode, PathPolicy};
pub use score::{PairKey, ScoreEntry, ScoreSet};
pub use snapshot::Snapshot;
