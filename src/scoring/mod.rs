//! Feature extraction and similarity scoring.
//!
//! # Module Structure
//!
//! - [`features`]: the [`FeatureTechnique`] trait and built-in techniques
//! - [`strategy`]: the [`SimilarityStrategy`] trait and [`WeightedFeatureStrategy`]
//! - [`presets`]: named strategy defaults
//! - [`plugins`]: named technique bundles

pub mod features;
pub mod plugins;
pub mod presets;
pub mod strategy;

pub use features::{
    AlphaPolarBreadth, FeatureTechnique, FnTechnique, LetterDepth, LetterVolume, SharedTechnique,
    ShapeUniqueLetters, ShapeVowelRatio, default_word_techniques, shape_techniques,
};
pub use plugins::PluginCatalog;
pub use presets::{StrategyPreset, WEIGHTED_STRATEGY_PRESETS, build_from_preset, list_presets};
pub use strategy::{
    AggregationMode, PresenceMode, SharedStrategy, SimilarityStrategy, WeightedFeatureStrategy,
    relative_similarity,
};
