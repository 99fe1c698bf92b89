//! Traversal and reorder policy.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a neighbor index aggregates the two directions of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    /// Entries grouped by source as stored.
    #[default]
    Directed,
    /// Both directions of a pair averaged and listed under each endpoint.
    Symmetrized,
}

impl DirectionMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Directed => "directed",
            Self::Symmetrized => "symmetrized",
        }
    }

    /// Returns both modes.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Directed, Self::Symmetrized]
    }

    /// Parses a mode name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an unknown mode.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "directed" => Ok(Self::Directed),
            "symmetrized" => Ok(Self::Symmetrized),
            other => Err(Error::InvalidConfiguration(format!(
                "unsupported direction mode '{other}' (expected directed or symmetrized)"
            ))),
        }
    }
}

impl fmt::Display for DirectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DirectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Declarative configuration for reorder and chain building.
///
/// A policy is a value; graphs bind to it through
/// [`crate::services::CogSystem::bind_graph_policy`]. Neighbor ranking is not
/// configurable: it is always score descending, then variance ascending, then
/// target id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathPolicy {
    /// Strategy the score set was built with.
    pub strategy_id: String,
    /// Score set consulted for neighbors.
    pub score_set_id: String,
    /// Index aggregation mode.
    #[serde(default)]
    pub direction_mode: DirectionMode,
    /// Exclude visited nodes from candidacy.
    #[serde(default = "default_true")]
    pub unseen_only: bool,
    /// Traverse nodes on hidden layers.
    #[serde(default)]
    pub include_hidden_layers: bool,
    /// Tolerance for [`crate::services::IterationEngine::equivalent_group`].
    #[serde(default = "default_epsilon")]
    pub equivalence_epsilon: f64,
    /// When set, chain steps gather near-equal neighbors within this range.
    #[serde(default)]
    pub group_range: Option<f64>,
    /// Neighbors below this score never qualify.
    #[serde(default)]
    pub min_score: Option<f64>,
    /// Maximum chain length, start included.
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

const fn default_true() -> bool {
    true
}

const fn default_epsilon() -> f64 {
    1e-9
}

impl PathPolicy {
    /// Creates a directed, unseen-only policy with no limits.
    #[must_use]
    pub fn new(strategy_id: impl Into<String>, score_set_id: impl Into<String>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            score_set_id: score_set_id.into(),
            direction_mode: DirectionMode::Directed,
            unseen_only: true,
            include_hidden_layers: false,
            equivalence_epsilon: default_epsilon(),
            group_range: None,
            min_score: None,
            max_depth: None,
            tags: Vec::new(),
        }
    }

    /// Sets the direction mode.
    #[must_use]
    pub const fn with_direction_mode(mut self, mode: DirectionMode) -> Self {
        self.direction_mode = mode;
        self
    }

    /// Sets whether visited nodes are excluded.
    #[must_use]
    pub const fn with_unseen_only(mut self, unseen_only: bool) -> Self {
        self.unseen_only = unseen_only;
        self
    }

    /// Sets whether hidden layers are traversed.
    #[must_use]
    pub const fn with_include_hidden_layers(mut self, include: bool) -> Self {
        self.include_hidden_layers = include;
        self
    }

    /// Sets the grouping range.
    #[must_use]
    pub const fn with_group_range(mut self, range: f64) -> Self {
        self.group_range = Some(range);
        self
    }

    /// Sets the minimum qualifying score.
    #[must_use]
    pub const fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// Sets the maximum chain length.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the equivalence tolerance.
    #[must_use]
    pub const fn with_equivalence_epsilon(mut self, epsilon: f64) -> Self {
        self.equivalence_epsilon = epsilon;
        self
    }

    /// Checks ranges and tolerances.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for negative or non-finite
    /// tolerances.
    pub fn validate(&self) -> Result<()> {
        if !(self.equivalence_epsilon.is_finite() && self.equivalence_epsilon >= 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "equivalence_epsilon must be a non-negative number, got {}",
                self.equivalence_epsilon
            )));
        }
        if let Some(range) = self.group_range
            && !(range.is_finite() && range >= 0.0)
        {
            return Err(Error::InvalidConfiguration(format!(
                "group_range must be a non-negative number, got {range}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("directed", DirectionMode::Directed; "directed")]
    #[test_case("Symmetrized", DirectionMode::Symmetrized; "symmetrized mixed case")]
    fn test_direction_mode_parse(input: &str, expected: DirectionMode) {
        assert_eq!(input.parse::<DirectionMode>().unwrap(), expected);
    }

    #[test]
    fn test_direction_mode_rejects_unknown() {
        let err = DirectionMode::parse("sideways").unwrap_err();
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn test_policy_defaults_from_json() {
        let policy: PathPolicy =
            serde_json::from_value(json!({"strategy_id": "s", "score_set_id": "ss"})).unwrap();
        assert_eq!(policy, PathPolicy::new("s", "ss"));
        assert!(policy.unseen_only);
        assert!((policy.equivalence_epsilon - 1e-9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_policy_rejects_unknown_direction_mode() {
        let result: std::result::Result<PathPolicy, _> = serde_json::from_value(
            json!({"strategy_id": "s", "score_set_id": "ss", "direction_mode": "both"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_has_no_selection_key() {
        let result: std::result::Result<PathPolicy, _> = serde_json::from_value(
            json!({"strategy_id": "s", "score_set_id": "ss", "selection_key": "score_desc"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_negative_range() {
        let policy = PathPolicy::new("s", "ss").with_group_range(-0.1);
        assert!(policy.validate().is_err());
        assert!(PathPolicy::new("s", "ss").with_group_range(0.0).validate().is_ok());
    }
}
