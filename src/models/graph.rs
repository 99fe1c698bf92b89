//! Cog graph types.
//!
//! A [`CogGraph`] is one base cog followed by two ordered buckets. Layers are
//! derived from position, never stored:
//!
//! | Role | Layers |
//! |------|--------|
//! | `Base` | `0` |
//! | `Adjacent` | `1..=adjacent_order.len()` |
//! | `Layered` | continue after the adjacent bucket |

use super::cog::CogId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Role of a node within a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// The anchor at layer 0.
    Base,
    /// Member of the adjacent bucket.
    Adjacent,
    /// Member of the layered bucket.
    Layered,
}

impl NodeRole {
    /// Returns the role as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Adjacent => "adjacent",
            Self::Layered => "layered",
        }
    }

    /// Single-letter tag used in text dumps.
    #[must_use]
    pub const fn tag(&self) -> char {
        match self {
            Self::Base => 'B',
            Self::Adjacent => 'A',
            Self::Layered => 'L',
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the two reorderable buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// The adjacent bucket.
    Adjacent,
    /// The layered bucket.
    #[default]
    Layered,
}

impl Bucket {
    /// Returns the bucket name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Adjacent => "adjacent",
            Self::Layered => "layered",
        }
    }

    /// Parses a bucket name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for anything other than
    /// `adjacent` or `layered`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "adjacent" => Ok(Self::Adjacent),
            "layered" => Ok(Self::Layered),
            other => Err(Error::InvalidConfiguration(format!(
                "unsupported bucket '{other}' (expected adjacent or layered)"
            ))),
        }
    }
}

impl FromStr for Bucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A derived view of one graph member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// The member cog.
    pub cog_id: CogId,
    /// Position-derived layer; 0 for the base.
    pub layer: i64,
    /// Which part of the graph holds the node.
    pub role: NodeRole,
}

/// One base cog plus adjacent and layered buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CogGraph {
    /// Unique identifier.
    pub id: String,
    /// The anchor cog at layer 0.
    pub base_cog_id: CogId,
    /// Adjacent bucket, in order.
    #[serde(default)]
    pub adjacent_order: Vec<CogId>,
    /// Layered bucket, in order.
    #[serde(default)]
    pub layered_order: Vec<CogId>,
    /// Layers excluded from traversal unless a policy includes them.
    #[serde(default)]
    pub hidden_layers: BTreeSet<i64>,
    /// Opaque context tag.
    #[serde(default)]
    pub context_hash: String,
    /// Mutation counter.
    #[serde(default = "default_version")]
    pub version: u64,
}

const fn default_version() -> u64 {
    1
}

impl CogGraph {
    /// Creates a graph holding only its base.
    #[must_use]
    pub fn new(id: impl Into<String>, base_cog_id: impl Into<CogId>) -> Self {
        Self {
            id: id.into(),
            base_cog_id: base_cog_id.into(),
            adjacent_order: Vec::new(),
            layered_order: Vec::new(),
            hidden_layers: BTreeSet::new(),
            context_hash: String::new(),
            version: 1,
        }
    }

    /// Sets the adjacent bucket.
    #[must_use]
    pub fn with_adjacent<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CogId>,
    {
        self.adjacent_order = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the layered bucket.
    #[must_use]
    pub fn with_layered<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CogId>,
    {
        self.layered_order = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the hidden layers.
    #[must_use]
    pub fn with_hidden_layers(mut self, layers: impl IntoIterator<Item = i64>) -> Self {
        self.hidden_layers = layers.into_iter().collect();
        self
    }

    /// Sets the context hash.
    #[must_use]
    pub fn with_context_hash(mut self, context_hash: impl Into<String>) -> Self {
        self.context_hash = context_hash.into();
        self
    }

    /// Returns `[base] ++ adjacent_order ++ layered_order`.
    #[must_use]
    pub fn ordered_ids(&self) -> Vec<CogId> {
        std::iter::once(&self.base_cog_id)
            .chain(&self.adjacent_order)
            .chain(&self.layered_order)
            .cloned()
            .collect()
    }

    /// Returns the derived nodes in order.
    #[must_use]
    pub fn nodes(&self) -> Vec<GraphNode> {
        let adjacent = self.adjacent_order.iter().map(|id| (id, NodeRole::Adjacent));
        let layered = self.layered_order.iter().map(|id| (id, NodeRole::Layered));
        std::iter::once((&self.base_cog_id, NodeRole::Base))
            .chain(adjacent)
            .chain(layered)
            .zip(0_i64..)
            .map(|((cog_id, role), layer)| GraphNode {
                cog_id: cog_id.clone(),
                layer,
                role,
            })
            .collect()
    }

    /// Returns the derived nodes keyed by cog id.
    #[must_use]
    pub fn node_map(&self) -> BTreeMap<CogId, GraphNode> {
        self.nodes()
            .into_iter()
            .map(|node| (node.cog_id.clone(), node))
            .collect()
    }

    /// Returns `true` when `cog_id` is the base or a bucket member.
    #[must_use]
    pub fn contains(&self, cog_id: &str) -> bool {
        self.base_cog_id.as_str() == cog_id
            || self.adjacent_order.iter().any(|id| id.as_str() == cog_id)
            || self.layered_order.iter().any(|id| id.as_str() == cog_id)
    }

    /// Returns the first id listed twice in `ordered_ids`, if any.
    #[must_use]
    pub fn first_duplicate(&self) -> Option<CogId> {
        let mut seen = BTreeSet::new();
        self.ordered_ids().into_iter().find(|id| !seen.insert(id.clone()))
    }

    /// Returns the bucket vector for `bucket`.
    pub const fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<CogId> {
        match bucket {
            Bucket::Adjacent => &mut self.adjacent_order,
            Bucket::Layered => &mut self.layered_order,
        }
    }

    /// Number of nodes including the base.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.adjacent_order.len() + self.layered_order.len()
    }

    /// Always `false`; a graph holds at least its base.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sample() -> CogGraph {
        CogGraph::new("g", "a")
            .with_adjacent(["b", "c"])
            .with_layered(["d"])
    }

    #[test]
    fn test_nodes_derive_layers_and_roles() {
        let nodes = sample().nodes();
        let summary: Vec<_> = nodes
            .iter()
            .map(|n| (n.cog_id.as_str().to_string(), n.layer, n.role))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a".to_string(), 0, NodeRole::Base),
                ("b".to_string(), 1, NodeRole::Adjacent),
                ("c".to_string(), 2, NodeRole::Adjacent),
                ("d".to_string(), 3, NodeRole::Layered),
            ]
        );
    }

    #[test]
    fn test_first_duplicate() {
        assert!(sample().first_duplicate().is_none());
        let dup = sample().with_layered(["b"]);
        assert_eq!(dup.first_duplicate(), Some(CogId::new("b")));
    }

    #[test]
    fn test_hidden_layers_serialize_sorted() {
        let graph = sample().with_hidden_layers([3, 1, 2]);
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["hidden_layers"], serde_json::json!([1, 2, 3]));
    }

    #[test_case("adjacent", Bucket::Adjacent; "adjacent")]
    #[test_case("LAYERED", Bucket::Layered; "layered uppercase")]
    fn test_bucket_parse(input: &str, expected: Bucket) {
        assert_eq!(Bucket::parse(input).unwrap(), expected);
    }

    #[test]
    fn test_bucket_parse_rejects_base() {
        assert!(matches!(
            Bucket::parse("base"),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
