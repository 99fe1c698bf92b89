//! Cog and component types.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Free-form metadata attached to cogs, components, snapshots and lineage.
pub type Metadata = serde_json::Map<String, Value>;

/// Namespaced feature values: `namespace -> feature_name -> value`.
pub type NamespacedValues = BTreeMap<String, BTreeMap<String, f64>>;

/// Namespaced technique bindings: `namespace -> feature_name -> technique_id`.
pub type TechniqueBindings = BTreeMap<String, BTreeMap<String, String>>;

/// Namespace holding the materialized `breadth`/`depth`/`volume` values.
pub const CORE_NAMESPACE: &str = "core";

/// Scoring metadata key listing the feature keys written by the last recompute.
pub const DERIVED_FEATURE_KEYS: &str = "derived_feature_keys";

/// Default scalar feature carrying a cog's directional bias.
pub const DIRECTIONAL_BIAS: &str = "directional_bias";

/// Unique identifier for a cog.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CogId(String);

impl CogId {
    /// Creates a new cog ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CogId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CogId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for CogId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CogId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A sub-part referenced by id from one or more cogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique identifier.
    pub id: String,
    /// Free-form component kind.
    pub kind: String,
    /// Opaque payload.
    #[serde(default)]
    pub payload: Value,
    /// Scalar feature values.
    #[serde(default)]
    pub feature_values: BTreeMap<String, f64>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Mutation counter.
    #[serde(default = "default_version")]
    pub version: u64,
}

impl Component {
    /// Creates a component with an empty payload.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            payload: Value::Null,
            feature_values: BTreeMap::new(),
            metadata: Metadata::new(),
            version: 1,
        }
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Feature technique bindings and the values they produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CogScoring {
    /// `namespace -> feature_name -> technique_id`.
    #[serde(default, deserialize_with = "namespaced_or_core")]
    pub feature_techniques: TechniqueBindings,
    /// `namespace -> feature_name -> value`, rebuilt on every recompute.
    #[serde(default, deserialize_with = "namespaced_or_core")]
    pub feature_values: NamespacedValues,
    /// Free-form metadata, including the derived key list.
    #[serde(default)]
    pub metadata: Metadata,
    /// Incremented on every recompute pass.
    #[serde(default)]
    pub version: u64,
}

impl CogScoring {
    /// Returns the feature keys written by the previous recompute pass.
    #[must_use]
    pub fn derived_feature_keys(&self) -> Vec<String> {
        self.metadata
            .get(DERIVED_FEATURE_KEYS)
            .and_then(Value::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Binds a technique to `namespace.feature_name`.
    pub fn bind(&mut self, namespace: &str, feature_name: &str, technique_id: &str) {
        self.feature_techniques
            .entry(namespace.to_string())
            .or_default()
            .insert(feature_name.to_string(), technique_id.to_string());
    }
}

/// A scored content unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cog {
    /// Unique identifier.
    pub id: CogId,
    /// Theme label; identical themes raise similarity.
    #[serde(default)]
    pub theme: String,
    /// Materialized `core.breadth`.
    #[serde(default)]
    pub breadth: f64,
    /// Materialized `core.depth`.
    #[serde(default, alias = "scope")]
    pub depth: f64,
    /// Materialized `core.volume`.
    #[serde(default)]
    pub volume: f64,
    /// Text content read by the word techniques.
    #[serde(default)]
    pub content: String,
    /// Referenced component ids.
    #[serde(default)]
    pub component_ids: Vec<String>,
    /// Flat scalar features, derived `ns.feature` keys included.
    #[serde(default)]
    pub features: BTreeMap<String, f64>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Technique bindings and derived values.
    #[serde(default)]
    pub scoring: CogScoring,
    /// Mutation counter.
    #[serde(default = "default_version")]
    pub version: u64,
}

impl Cog {
    /// Creates a cog with empty content and zeroed core features.
    #[must_use]
    pub fn new(id: impl Into<CogId>, theme: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            theme: theme.into(),
            breadth: 0.0,
            depth: 0.0,
            volume: 0.0,
            content: String::new(),
            component_ids: Vec::new(),
            features: BTreeMap::new(),
            metadata: Metadata::new(),
            scoring: CogScoring::default(),
            version: 1,
        }
    }

    /// Sets the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the materialized core values.
    #[must_use]
    pub const fn with_core(mut self, breadth: f64, depth: f64, volume: f64) -> Self {
        self.breadth = breadth;
        self.depth = depth;
        self.volume = volume;
        self
    }

    /// Sets a flat scalar feature.
    #[must_use]
    pub fn with_feature(mut self, key: impl Into<String>, value: f64) -> Self {
        self.features.insert(key.into(), value);
        self
    }

    /// Adds a referenced component id.
    #[must_use]
    pub fn with_component(mut self, component_id: impl Into<String>) -> Self {
        self.component_ids.push(component_id.into());
        self
    }

    /// Binds a feature technique.
    #[must_use]
    pub fn with_technique(mut self, namespace: &str, feature_name: &str, technique_id: &str) -> Self {
        self.scoring.bind(namespace, feature_name, technique_id);
        self
    }

    /// Returns the content, or the theme when the content is empty.
    #[must_use]
    pub fn text(&self) -> &str {
        if self.content.is_empty() {
            &self.theme
        } else {
            &self.content
        }
    }

    /// Returns the scalar feature `key`, or `0.0` when absent.
    #[must_use]
    pub fn feature(&self, key: &str) -> f64 {
        self.features.get(key).copied().unwrap_or(0.0)
    }

    /// Returns the value of a materialized core field by feature name.
    #[must_use]
    pub fn core_value(&self, feature_name: &str) -> Option<f64> {
        match feature_name {
            "breadth" => Some(self.breadth),
            "depth" => Some(self.depth),
            "volume" => Some(self.volume),
            _ => None,
        }
    }

    /// Writes a materialized core field by feature name. Returns `false` for
    /// names outside the core triple.
    pub fn set_core_value(&mut self, feature_name: &str, value: f64) -> bool {
        match feature_name {
            "breadth" => self.breadth = value,
            "depth" => self.depth = value,
            "volume" => self.volume = value,
            _ => return false,
        }
        true
    }
}

const fn default_version() -> u64 {
    1
}

/// Accepts a namespaced map or a flat map that is read as the `core` namespace.
#[derive(Deserialize)]
#[serde(untagged, bound(deserialize = "T: Deserialize<'de>"))]
enum NamespacedOrFlat<T> {
    Namespaced(BTreeMap<String, BTreeMap<String, T>>),
    Flat(BTreeMap<String, T>),
}

fn namespaced_or_core<'de, D, T>(
    deserializer: D,
) -> Result<BTreeMap<String, BTreeMap<String, T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match NamespacedOrFlat::<T>::deserialize(deserializer)? {
        NamespacedOrFlat::Namespaced(map) => map,
        NamespacedOrFlat::Flat(flat) if flat.is_empty() => BTreeMap::new(),
        NamespacedOrFlat::Flat(flat) => BTreeMap::from([(CORE_NAMESPACE.to_string(), flat)]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cog_id_borrows_as_str() {
        let mut set = std::collections::BTreeSet::new();
        set.insert(CogId::new("a"));
        assert!(set.contains("a"));
        assert_eq!(CogId::from("a").to_string(), "a");
    }

    #[test]
    fn test_text_falls_back_to_theme() {
        let cog = Cog::new("a", "billing");
        assert_eq!(cog.text(), "billing");
        let cog = cog.with_content("invoice");
        assert_eq!(cog.text(), "invoice");
    }

    #[test]
    fn test_core_value_accessors() {
        let mut cog = Cog::new("a", "t").with_core(0.1, 0.2, 0.3);
        assert_eq!(cog.core_value("depth"), Some(0.2));
        assert_eq!(cog.core_value("shape"), None);
        assert!(cog.set_core_value("volume", 9.0));
        assert!(!cog.set_core_value("unique_letters", 1.0));
        assert!((cog.volume - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flat_feature_values_load_as_core() {
        let cog: Cog = serde_json::from_value(json!({
            "id": "a",
            "theme": "t",
            "scope": 4.0,
            "scoring": {
                "feature_techniques": {"breadth": "alpha_polar_breadth"},
                "feature_values": {"breadth": 0.5}
            }
        }))
        .unwrap();

        assert!((cog.depth - 4.0).abs() < f64::EPSILON);
        assert_eq!(cog.scoring.feature_values["core"]["breadth"], 0.5);
        assert_eq!(
            cog.scoring.feature_techniques["core"]["breadth"],
            "alpha_polar_breadth"
        );
        assert_eq!(cog.version, 1);
    }

    #[test]
    fn test_namespaced_feature_values_load_unchanged() {
        let scoring: CogScoring = serde_json::from_value(json!({
            "feature_values": {"shape": {"unique_letters": 3.0}},
            "version": 2
        }))
        .unwrap();
        assert_eq!(scoring.feature_values["shape"]["unique_letters"], 3.0);
        assert!(scoring.feature_techniques.is_empty());
    }

    #[test]
    fn test_derived_feature_keys() {
        let mut scoring = CogScoring::default();
        assert!(scoring.derived_feature_keys().is_empty());
        scoring
            .metadata
            .insert(DERIVED_FEATURE_KEYS.to_string(), json!(["breadth", "core.breadth"]));
        assert_eq!(scoring.derived_feature_keys(), vec!["breadth", "core.breadth"]);
    }
}
