//! Append-only lineage records.

use super::cog::Metadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of structural mutation recorded in the lineage log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpType {
    /// Buckets sorted by similarity to the base.
    Reorder,
    /// Adjacent and layered buckets exchanged.
    SwapAdjacentLayered,
    /// Graph base moved.
    SetBase,
    /// Hidden layer set replaced.
    SetHiddenLayers,
    /// Several cogs merged into a new one.
    Compose,
    /// One cog tokenized into children.
    Split,
}

impl OpType {
    /// Returns the operation name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reorder => "reorder",
            Self::SwapAdjacentLayered => "swap_adjacent_layered",
            Self::SetBase => "set_base",
            Self::SetHiddenLayers => "set_hidden_layers",
            Self::Compose => "compose",
            Self::Split => "split",
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit record. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageOperation {
    /// Operation kind.
    pub op_type: OpType,
    /// Ids the operation read.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Ids the operation produced or reordered.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Operation-specific details.
    #[serde(default)]
    pub metadata: Metadata,
}

impl LineageOperation {
    /// Creates a record with empty metadata.
    #[must_use]
    pub fn new(op_type: OpType, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        Self {
            op_type,
            inputs,
            outputs,
            metadata: Metadata::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_type_serializes_snake_case() {
        let op = LineageOperation::new(OpType::SwapAdjacentLayered, vec![], vec![])
            .with_meta("graph_id", "g");
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["op_type"], "swap_adjacent_layered");
        assert_eq!(value["metadata"]["graph_id"], "g");
        assert_eq!(OpType::SetHiddenLayers.to_string(), "set_hidden_layers");
    }
}
