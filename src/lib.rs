//! # Cogmesh
//!
//! Similarity-ordered graphs of content units ("cogs").
//!
//! Cogmesh keeps a mutable collection of cogs, scores every ordered pair with
//! a pluggable similarity strategy, ranks neighbors deterministically, and
//! walks those rankings to reorder graphs and build traversal chains. A cog
//! mutation cascades synchronously into rescoring, index invalidation, and
//! reorder of every graph bound to an affected score set.
//!
//! ## Features
//!
//! - Pluggable feature techniques and weighted similarity strategies with presets
//! - Directed and symmetrized neighbor indices with strict tie-breaking
//! - Greedy traversal chains with near-equal grouping
//! - Synchronous cascade with a per-call [`models::CascadeReport`]
//! - JSON snapshots and a workspace-scoped tool surface
//!
//! ## Example
//!
//! ```rust
//! use cogmesh::models::{Cog, CogGraph, DirectionMode, PathPolicy};
//! use cogmesh::services::{CogSystem, IterationEngine};
//!
//! # fn main() -> cogmesh::Result<()> {
//! let mut system = CogSystem::new();
//! system.register_default_word_feature_techniques();
//! system.register_weighted_strategy_preset("aggregate_common", Some("weighted"), None)?;
//! for (id, content) in [("a", "ledger"), ("b", "ledgers"), ("c", "zebra")] {
//!     system.add_cog(Cog::new(id, "finance").with_content(content))?;
//! }
//! system.create_score_set("scores", "weighted", "ctx", None)?;
//! system.add_graph(CogGraph::new("g", "a").with_adjacent(["b", "c"]))?;
//!
//! let policy = PathPolicy::new("weighted", "scores").with_direction_mode(DirectionMode::Directed);
//! let chain = IterationEngine::new(&mut system).build_chain("g", &policy, None, None)?;
//! assert_eq!(chain.chain.first().map(|id| id.as_str()), Some("a"));
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod index;
pub mod mcp;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod scoring;
pub mod security;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::CogmeshConfig;
pub use index::{IndexCache, Neighbor, NeighborIndex};
pub use mcp::ToolDispatcher;
pub use models::{
    CascadeReport, Cog, CogGraph, CogId, Component, DirectionMode, PathPolicy, ScoreEntry,
    ScoreSet, Snapshot,
};
pub use scoring::{FeatureTechnique, SimilarityStrategy, WeightedFeatureStrategy};
pub use services::{CogSystem, IterationEngine};
pub use storage::JsonSnapshotStore;

/// Error type for cogmesh operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `UnknownReference` | A cog, graph, score set, strategy, technique, preset, plugin or tool id is not registered |
/// | `InvalidConfiguration` | Unsupported direction/presence/aggregation/split mode, bad preset override, negative tolerance |
/// | `PreconditionFailed` | Base not in graph, compose with fewer than two ids, split with no tokens, duplicate graph members |
/// | `DuplicateId` | A new cog or graph id collides with an existing one |
/// | `PathViolation` | A snapshot path escapes the workspace storage root |
/// | `UnsupportedField` | A cog update names a field that does not exist or is read-only |
/// | `InvalidInput` | Malformed tool arguments or field values |
/// | `OperationFailed` | Filesystem I/O or serialization fails |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A referenced entity does not exist.
    ///
    /// Raised when:
    /// - A cog, graph or score set id is unknown
    /// - A strategy or feature technique id is not registered
    /// - A preset, plugin or tool name is not known
    #[error("unknown {kind} '{id}'")]
    UnknownReference {
        /// The kind of entity (cog, graph, `score_set`, ...).
        kind: String,
        /// The id that failed to resolve.
        id: String,
    },

    /// A configuration value is not supported.
    ///
    /// Raised when:
    /// - A direction, presence, aggregation or split mode string is unknown
    /// - Preset overrides contain unknown keys or wrongly typed values
    /// - A tolerance or range is negative
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A precondition of the operation does not hold.
    ///
    /// Raised when:
    /// - A new base is not a member of the graph
    /// - Compose receives fewer than two cog ids
    /// - Split produces no tokens
    /// - A graph lists the same cog twice or references an unknown cog
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// A new id collides with an existing one.
    #[error("{kind} '{id}' already exists")]
    DuplicateId {
        /// The kind of entity.
        kind: String,
        /// The colliding id.
        id: String,
    },

    /// A filesystem path escapes its permitted root.
    ///
    /// Raised when:
    /// - A snapshot path is absolute
    /// - A snapshot path climbs out of the storage root with `..`
    #[error("path '{path}' rejected: {reason}")]
    PathViolation {
        /// The offending path as given.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An update names a field that cannot be written.
    #[error("{entity} has no writable field '{field}'")]
    UnsupportedField {
        /// The entity being updated.
        entity: String,
        /// The field name.
        field: String,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - JSON deserialization of tool arguments fails
    /// - A cog update value has the wrong type
    /// - A workspace scope segment is not a safe path segment
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O errors occur
    /// - Snapshot serialization or parsing fails
    /// - Observability initialization fails
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::UnknownReference`].
    pub fn unknown(kind: &str, id: impl Into<String>) -> Self {
        Self::UnknownReference {
            kind: kind.to_string(),
            id: id.into(),
        }
    }

    /// Builds an [`Error::DuplicateId`].
    pub fn duplicate(kind: &str, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind: kind.to_string(),
            id: id.into(),
        }
    }

    /// Builds an [`Error::OperationFailed`] from any displayable cause.
    pub fn failed(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for cogmesh operations.
pub type Result<T> = std::result::Result<T, Error>;
