//! Named default configurations for [`WeightedFeatureStrategy`].

use super::strategy::WeightedFeatureStrategy;
use crate::models::Metadata;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// A named, described set of strategy defaults.
#[derive(Debug, Clone, Copy)]
pub struct StrategyPreset {
    /// Preset id.
    pub id: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    defaults: fn() -> Value,
}

impl StrategyPreset {
    /// Returns the preset defaults as a JSON object.
    #[must_use]
    pub fn defaults(&self) -> Value {
        (self.defaults)()
    }
}

/// Every built-in preset.
pub const WEIGHTED_STRATEGY_PRESETS: &[StrategyPreset] = &[
    StrategyPreset {
        id: "balanced_common_per_namespace",
        description: "Per-namespace scoring over common namespaces and features; \
                      balanced for stable deterministic traversal.",
        defaults: || {
            json!({
                "feature_namespace_mode": "per_namespace",
                "namespace_presence_mode": "common",
                "feature_presence_mode": "common",
                "theme_weight": 0.20,
                "namespace_weights": {"core": 1.0},
            })
        },
    },
    StrategyPreset {
        id: "aggregate_common",
        description: "Aggregate scoring over common namespaces and features only; \
                      one collapsed feature surface.",
        defaults: || {
            json!({
                "feature_namespace_mode": "aggregate",
                "namespace_presence_mode": "common",
                "feature_presence_mode": "common",
                "theme_weight": 0.20,
                "namespace_weights": {"core": 1.0},
            })
        },
    },
    StrategyPreset {
        id: "aggregate_all_penalize_missing",
        description: "Aggregate scoring over the union of namespaces and features; \
                      missing values count as zero to penalize asymmetry.",
        defaults: || {
            json!({
                "feature_namespace_mode": "aggregate",
                "namespace_presence_mode": "all",
                "feature_presence_mode": "all",
                "theme_weight": 0.20,
                "namespace_weights": {"core": 1.0},
            })
        },
    },
    StrategyPreset {
        id: "shape_aware_per_namespace",
        description: "Per-namespace comparison over common keys with extra weight \
                      on the shape namespace.",
        defaults: || {
            json!({
                "feature_namespace_mode": "per_namespace",
                "namespace_presence_mode": "common",
                "feature_presence_mode": "common",
                "theme_weight": 0.20,
                "namespace_weights": {"core": 1.0, "shape": 0.5},
            })
        },
    },
];

/// Looks up a preset by id.
#[must_use]
pub fn find_preset(preset_id: &str) -> Option<&'static StrategyPreset> {
    WEIGHTED_STRATEGY_PRESETS.iter().find(|p| p.id == preset_id)
}

/// Preset id to description.
#[must_use]
pub fn list_presets() -> BTreeMap<String, String> {
    WEIGHTED_STRATEGY_PRESETS
        .iter()
        .map(|p| (p.id.to_string(), p.description.to_string()))
        .collect()
}

/// Builds a strategy from a preset with `overrides` merged over its defaults.
///
/// The strategy id is `strategy_id`, else an `id` override, else the preset id.
///
/// # Errors
///
/// Returns [`Error::UnknownReference`] for an unknown preset and
/// [`Error::InvalidConfiguration`] when an override names an unknown field or
/// carries an unsupported value.
pub fn build_from_preset(
    preset_id: &str,
    strategy_id: Option<&str>,
    overrides: Option<&Metadata>,
) -> Result<WeightedFeatureStrategy> {
    let preset = find_preset(preset_id).ok_or_else(|| {
        let known: Vec<&str> = WEIGHTED_STRATEGY_PRESETS.iter().map(|p| p.id).collect();
        Error::unknown("strategy preset", format!("{preset_id} (known presets: {})", known.join(", ")))
    })?;

    let mut config = match preset.defaults() {
        Value::Object(map) => map,
        _ => Metadata::new(),
    };
    if let Some(overrides) = overrides {
        config.extend(overrides.clone());
    }
    let id = strategy_id
        .map(str::to_string)
        .or_else(|| config.get("id").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| preset_id.to_string());
    config.insert("id".to_string(), Value::String(id));

    serde_json::from_value(Value::Object(config)).map_err(|e| {
        Error::InvalidConfiguration(format!("preset '{preset_id}' overrides rejected: {e}"))
    })
}
