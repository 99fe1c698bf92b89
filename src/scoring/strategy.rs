//! Similarity strategies.
//!
//! The weighted feature strategy compares two cogs' namespaced feature values
//! and theme, then blends in extra scalar features and a directional bias:
//!
//! 1. `theme_score` is 1 for identical themes, else 0.
//! 2. Namespaces and features are chosen by presence mode (`common` is the
//!    intersection, `all` the union; missing values read as 0). Each feature
//!    compares as `1 - |a - b| / max(|a|, |b|, 1)`, clamped.
//! 3. `per_namespace` averages namespace scores; `aggregate` averages every
//!    feature similarity weighted by `feature_weight * namespace_weight`.
//! 4. `base = theme_weight * theme_score + (1 - theme_weight) * feature_score`.
//! 5. Extra features blend as `(base + sum(w * sim)) / (1 + sum(w))`.
//! 6. `(source_bias - target_bias) * 0.05` is added and the result clamped.

use crate::models::{CORE_NAMESPACE, Cog, DIRECTIONAL_BIAS, NamespacedValues, ScoreEntry};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Scale applied to the directional bias difference.
pub const DIRECTIONAL_SCALE: f64 = 0.05;

/// Scores a directed pair of cogs.
pub trait SimilarityStrategy: Send + Sync {
    /// Registry id.
    fn id(&self) -> &str;

    /// Produces the directed entry `source -> target`.
    fn score(&self, source: &Cog, target: &Cog) -> ScoreEntry;
}

/// Shared handle to a registered strategy.
pub type SharedStrategy = Arc<dyn SimilarityStrategy>;

/// How feature similarities collapse into one feature score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Weighted average over every feature.
    #[default]
    Aggregate,
    /// Weighted average over per-namespace averages.
    PerNamespace,
}

/// Which namespaces or features take part in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceMode {
    /// Only keys both cogs have.
    #[default]
    Common,
    /// Keys either cog has; missing values read as 0.
    All,
}

impl AggregationMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::PerNamespace => "per_namespace",
        }
    }

    /// Parses a mode name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an unknown mode.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "aggregate" => Ok(Self::Aggregate),
            "per_namespace" => Ok(Self::PerNamespace),
            other => Err(Error::InvalidConfiguration(format!(
                "unsupported aggregation mode '{other}' (expected aggregate or per_namespace)"
            ))),
        }
    }
}

impl PresenceMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::All => "all",
        }
    }

    /// Parses a mode name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an unknown mode.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "common" => Ok(Self::Common),
            "all" => Ok(Self::All),
            other => Err(Error::InvalidConfiguration(format!(
                "unsupported presence mode '{other}' (expected common or all)"
            ))),
        }
    }

    fn select<'a, I>(self, left: I, right: I) -> BTreeSet<&'a str>
    where
        I: Iterator<Item = &'a String>,
    {
        let left: BTreeSet<&str> = left.map(String::as_str).collect();
        let right: BTreeSet<&str> = right.map(String::as_str).collect();
        match self {
            Self::Common => left.intersection(&right).copied().collect(),
            Self::All => left.union(&right).copied().collect(),
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for PresenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The reference strategy: weighted comparison of namespaced features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightedFeatureStrategy {
    /// Registry id.
    pub id: String,
    /// Share of the base score taken by theme identity.
    pub theme_weight: f64,
    /// Weight of `core.breadth` unless `feature_weights` overrides it.
    pub breadth_weight: f64,
    /// Weight of `core.depth` unless `feature_weights` overrides it.
    pub depth_weight: f64,
    /// Weight of `core.volume` unless `feature_weights` overrides it.
    pub volume_weight: f64,
    /// How feature similarities collapse.
    pub feature_namespace_mode: AggregationMode,
    /// Namespace selection.
    pub namespace_presence_mode: PresenceMode,
    /// Feature selection within a namespace.
    pub feature_presence_mode: PresenceMode,
    /// Per-namespace weights, default 1.0.
    pub namespace_weights: BTreeMap<String, f64>,
    /// Per-feature weights keyed `ns.feature` or `feature`.
    pub feature_weights: BTreeMap<String, f64>,
    /// Scalar feature holding the directional bias.
    pub directional_bias_feature: String,
    /// Extra scalar features read from `Cog::features`.
    pub extra_feature_weights: BTreeMap<String, f64>,
}

impl Default for WeightedFeatureStrategy {
    fn default() -> Self {
        Self {
            id: "weighted_default".to_string(),
            theme_weight: 0.20,
            breadth_weight: 1.0,
            depth_weight: 1.0,
            volume_weight: 1.0,
            feature_namespace_mode: AggregationMode::Aggregate,
            namespace_presence_mode: PresenceMode::Common,
            feature_presence_mode: PresenceMode::Common,
            namespace_weights: BTreeMap::new(),
            feature_weights: BTreeMap::new(),
            directional_bias_feature: DIRECTIONAL_BIAS.to_string(),
            extra_feature_weights: BTreeMap::new(),
        }
    }
}

fn clamp_01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Bounded relative similarity of two scalars.
#[must_use]
pub fn relative_similarity(left: f64, right: f64) -> f64 {
    let denom = left.abs().max(right.abs()).max(1.0);
    clamp_01(1.0 - (left - right).abs() / denom)
}

fn weighted_average(pairs: &[(f64, f64)]) -> f64 {
    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return 0.0;
    }
    pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total
}

/// Namespaced values of a cog with the core triple filled from its fields.
#[must_use]
pub fn normalized_values(cog: &Cog) -> NamespacedValues {
    let mut values = cog.scoring.feature_values.clone();
    let core = values.entry(CORE_NAMESPACE.to_string()).or_default();
    core.entry("breadth".to_string()).or_insert(cog.breadth);
    core.entry("depth".to_string()).or_insert(cog.depth);
    core.entry("volume".to_string()).or_insert(cog.volume);
    values
}

impl WeightedFeatureStrategy {
    /// Creates the default strategy under `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the theme weight.
    #[must_use]
    pub const fn with_theme_weight(mut self, weight: f64) -> Self {
        self.theme_weight = weight;
        self
    }

    /// Sets the aggregation mode.
    #[must_use]
    pub const fn with_aggregation(mut self, mode: AggregationMode) -> Self {
        self.feature_namespace_mode = mode;
        self
    }

    /// Sets both presence modes.
    #[must_use]
    pub const fn with_presence(mut self, namespaces: PresenceMode, features: PresenceMode) -> Self {
        self.namespace_presence_mode = namespaces;
        self.feature_presence_mode = features;
        self
    }

    /// Sets a feature weight keyed `ns.feature` or `feature`.
    #[must_use]
    pub fn with_feature_weight(mut self, key: impl Into<String>, weight: f64) -> Self {
        self.feature_weights.insert(key.into(), weight);
        self
    }

    /// Sets a namespace weight.
    #[must_use]
    pub fn with_namespace_weight(mut self, namespace: impl Into<String>, weight: f64) -> Self {
        self.namespace_weights.insert(namespace.into(), weight);
        self
    }

    /// Sets an extra scalar feature weight.
    #[must_use]
    pub fn with_extra_feature(mut self, feature: impl Into<String>, weight: f64) -> Self {
        self.extra_feature_weights.insert(feature.into(), weight);
        self
    }

    fn namespace_weight(&self, namespace: &str) -> f64 {
        self.namespace_weights.get(namespace).copied().unwrap_or(1.0)
    }

    fn feature_weight(&self, namespace: &str, feature_name: &str) -> f64 {
        if let Some(weight) = self.feature_weights.get(&format!("{namespace}.{feature_name}")) {
            return *weight;
        }
        if namespace == CORE_NAMESPACE {
            match feature_name {
                "breadth" => return self.breadth_weight,
                "depth" => return self.depth_weight,
                "volume" => return self.volume_weight,
                _ => {},
            }
        }
        self.feature_weights.get(feature_name).copied().unwrap_or(1.0)
    }
}

impl SimilarityStrategy for WeightedFeatureStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn score(&self, source: &Cog, target: &Cog) -> ScoreEntry {
        let theme_score = if source.theme == target.theme { 1.0 } else { 0.0 };
        let source_ns = normalized_values(source);
        let target_ns = normalized_values(target);
        let empty = BTreeMap::new();

        let mut vector = BTreeMap::from([("theme_match".to_string(), theme_score)]);
        let mut namespace_scores = Vec::new();
        let mut aggregate_pairs = Vec::new();
        let mut similarities = Vec::new();

        for namespace in self
            .namespace_presence_mode
            .select(source_ns.keys(), target_ns.keys())
        {
            let left = source_ns.get(namespace).unwrap_or(&empty);
            let right = target_ns.get(namespace).unwrap_or(&empty);
            let namespace_weight = self.namespace_weight(namespace);
            let mut feature_pairs = Vec::new();

            for feature in self.feature_presence_mode.select(left.keys(), right.keys()) {
                let similarity = relative_similarity(
                    left.get(feature).copied().unwrap_or(0.0),
                    right.get(feature).copied().unwrap_or(0.0),
                );
                vector.insert(format!("feature:{namespace}.{feature}"), similarity);
                similarities.push(similarity);
                let weight = self.feature_weight(namespace, feature);
                feature_pairs.push((similarity, weight));
                aggregate_pairs.push((similarity, weight * namespace_weight));
            }

            let namespace_score = weighted_average(&feature_pairs);
            vector.insert(format!("namespace:{namespace}"), namespace_score);
            namespace_scores.push((namespace_score, namespace_weight));
        }

        let feature_score = match self.feature_namespace_mode {
            AggregationMode::PerNamespace => weighted_average(&namespace_scores),
            AggregationMode::Aggregate => weighted_average(&aggregate_pairs),
        };

        for (name, left, right) in [
            ("breadth", source.breadth, target.breadth),
            ("depth", source.depth, target.depth),
            ("volume", source.volume, target.volume),
        ] {
            let similarity = vector
                .get(&format!("feature:{CORE_NAMESPACE}.{name}"))
                .copied()
                .unwrap_or_else(|| relative_similarity(left, right));
            vector.insert(format!("{name}_similarity"), similarity);
        }

        let mut base_score =
            self.theme_weight.mul_add(theme_score, (1.0 - self.theme_weight) * feature_score);

        let mut weighted_extra = 0.0;
        let mut total_extra_weight = 0.0;
        for (feature, weight) in &self.extra_feature_weights {
            let similarity = clamp_01(1.0 - (source.feature(feature) - target.feature(feature)).abs());
            vector.insert(format!("feature:{feature}"), similarity);
            total_extra_weight += weight;
            weighted_extra += weight * similarity;
        }
        if total_extra_weight > 0.0 {
            base_score = (base_score + weighted_extra) / (1.0 + total_extra_weight);
        }

        let adjustment = (source.feature(&self.directional_bias_feature)
            - target.feature(&self.directional_bias_feature))
            * DIRECTIONAL_SCALE;
        vector.insert("directional_adjustment".to_string(), adjustment);

        let variance = similarities
            .iter()
            .copied()
            .fold(None, |acc: Option<(f64, f64)>, s| {
                Some(acc.map_or((s, s), |(lo, hi)| (lo.min(s), hi.max(s))))
            })
            .map_or(0.0, |(lo, hi)| hi - lo);

        ScoreEntry {
            from_cog_id: source.id.clone(),
            to_cog_id: target.id.clone(),
            score: clamp_01(base_score + adjustment),
            vector,
            variance,
            strategy_id: self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core_cog(id: &str, breadth: f64) -> Cog {
        Cog::new(id, "same").with_core(breadth, 0.0, 0.0)
    }

    fn breadth_only() -> WeightedFeatureStrategy {
        WeightedFeatureStrategy::new("w")
            .with_feature_weight("core.depth", 0.0)
            .with_feature_weight("core.volume", 0.0)
    }

    #[test]
    fn test_relative_similarity_bounds() {
        assert!((relative_similarity(0.0, 0.0) - 1.0).abs() < f64::EPSILON);
        assert!((relative_similarity(10.0, 5.0) - 0.5).abs() < f64::EPSILON);
        assert!(relative_similarity(-10.0, 10.0).abs() < f64::EPSILON);
        assert!((relative_similarity(0.5, 0.0) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_closer_breadth_scores_higher() {
        let strategy = breadth_only();
        let a = core_cog("A", 0.70);
        let b = core_cog("B", 0.69);
        let c = core_cog("C", 0.40);
        assert!(strategy.score(&a, &b).score > strategy.score(&a, &c).score);
    }

    #[test]
    fn test_theme_contributes_theme_weight() {
        let strategy = WeightedFeatureStrategy::new("w");
        let a = Cog::new("a", "x");
        let b = Cog::new("b", "y");
        let entry = strategy.score(&a, &b);
        assert!((entry.score - 0.8).abs() < 1e-12);
        assert!((entry.vector["theme_match"]).abs() < f64::EPSILON);
        assert!((entry.vector["namespace:core"] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_directional_bias_is_asymmetric() {
        let strategy = WeightedFeatureStrategy::new("w");
        let a = Cog::new("a", "x").with_feature(DIRECTIONAL_BIAS, 1.0);
        let b = Cog::new("b", "y");
        let forward = strategy.score(&a, &b);
        let backward = strategy.score(&b, &a);
        assert!((forward.score - 0.85).abs() < 1e-12);
        assert!((backward.score - 0.75).abs() < 1e-12);
        assert!((forward.vector["directional_adjustment"] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_all_presence_penalizes_missing_namespace() {
        let mut a = Cog::new("a", "t");
        a.scoring
            .feature_values
            .insert("shape".to_string(), BTreeMap::from([("unique_letters".to_string(), 4.0)]));
        let b = Cog::new("b", "t");

        let common = WeightedFeatureStrategy::new("common");
        let all = WeightedFeatureStrategy::new("all").with_presence(PresenceMode::All, PresenceMode::All);

        let common_entry = common.score(&a, &b);
        let all_entry = all.score(&a, &b);
        assert!(!common_entry.vector.contains_key("namespace:shape"));
        assert!(all_entry.vector["feature:shape.unique_letters"] < 0.5);
        assert!(all_entry.score < common_entry.score);
        assert!((all_entry.variance - 1.0).abs() < 1e-12);
        assert!(common_entry.variance.abs() < f64::EPSILON);
    }

    #[test]
    fn test_per_namespace_weights_namespaces() {
        let mut a = Cog::new("a", "t");
        a.scoring
            .feature_values
            .insert("shape".to_string(), BTreeMap::from([("n".to_string(), 0.0)]));
        let mut b = Cog::new("b", "t");
        b.scoring
            .feature_values
            .insert("shape".to_string(), BTreeMap::from([("n".to_string(), 2.0)]));

        let strategy = WeightedFeatureStrategy::new("p")
            .with_aggregation(AggregationMode::PerNamespace)
            .with_namespace_weight("shape", 0.5);
        let entry = strategy.score(&a, &b);
        // core = 1.0 (weight 1), shape = 0.0 (weight 0.5) -> 2/3
        let expected = 0.2f64.mul_add(1.0, 0.8 * (2.0 / 3.0));
        assert!((entry.score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_extra_features_blend() {
        let strategy = WeightedFeatureStrategy::new("e")
            .with_theme_weight(0.0)
            .with_extra_feature("mood", 1.0);
        let a = Cog::new("a", "t").with_feature("mood", 0.0);
        let b = Cog::new("b", "t").with_feature("mood", 1.0);
        let entry = strategy.score(&a, &b);
        assert!((entry.score - 0.5).abs() < 1e-12);
        assert!(entry.vector["feature:mood"].abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_weights_give_zero_feature_score() {
        let strategy = WeightedFeatureStrategy {
            breadth_weight: 0.0,
            depth_weight: 0.0,
            volume_weight: 0.0,
            theme_weight: 0.0,
            ..WeightedFeatureStrategy::default()
        };
        let entry = strategy.score(&Cog::new("a", "t"), &Cog::new("b", "t"));
        assert!(entry.score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_mode_rejected_on_deserialize() {
        let result: std::result::Result<WeightedFeatureStrategy, _> =
            serde_json::from_value(serde_json::json!({"namespace_presence_mode": "most"}));
        assert!(result.is_err());
        assert!(PresenceMode::parse("most").is_err());
        assert_eq!(AggregationMode::parse("per_namespace").unwrap(), AggregationMode::PerNamespace);
    }
}
