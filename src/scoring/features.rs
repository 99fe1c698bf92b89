//! Feature techniques.
//!
//! A technique maps a cog to one scalar and is addressed by an opaque id.
//! Word techniques read [`Cog::text`] and consider alphabetic characters only,
//! lowercased.
//!
//! | Technique | Feature | Value |
//! |-----------|---------|-------|
//! | `alpha_polar_breadth` | `core.breadth` | highest minus lowest letter index (`a` = 0) |
//! | `letter_depth` | `core.depth` | count of the most frequent letter |
//! | `letter_volume` | `core.volume` | number of letters |
//! | `shape_unique_letters` | `shape.unique_letters` | distinct letters |
//! | `shape_vowel_ratio` | `shape.vowel_ratio` | vowels over letters |

use crate::models::{CORE_NAMESPACE, Cog};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// A pure `cog -> scalar` calculator bound to `namespace.feature_name`.
pub trait FeatureTechnique: Send + Sync {
    /// Registry id.
    fn id(&self) -> &str;

    /// Namespace the value is written under.
    fn namespace(&self) -> &str;

    /// Feature name within the namespace.
    fn feature_name(&self) -> &str;

    /// Computes the feature value.
    fn calculate(&self, cog: &Cog) -> f64;
}

/// Shared handle to a registered technique.
pub type SharedTechnique = Arc<dyn FeatureTechnique>;

type Calculator = dyn Fn(&Cog) -> f64 + Send + Sync;

/// A technique backed by a closure.
#[derive(Clone)]
pub struct FnTechnique {
    id: String,
    namespace: String,
    feature_name: String,
    calculator: Arc<Calculator>,
}

impl FnTechnique {
    /// Wraps `calculator` as a technique.
    pub fn new<F>(
        id: impl Into<String>,
        namespace: impl Into<String>,
        feature_name: impl Into<String>,
        calculator: F,
    ) -> Self
    where
        F: Fn(&Cog) -> f64 + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            feature_name: feature_name.into(),
            calculator: Arc::new(calculator),
        }
    }
}

impl fmt::Debug for FnTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTechnique")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("feature_name", &self.feature_name)
            .finish_non_exhaustive()
    }
}

impl FeatureTechnique for FnTechnique {
    fn id(&self) -> &str {
        &self.id
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn feature_name(&self) -> &str {
        &self.feature_name
    }

    fn calculate(&self, cog: &Cog) -> f64 {
        (self.calculator)(cog)
    }
}

fn letters(cog: &Cog) -> Vec<char> {
    cog.text()
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

fn letter_index(c: char) -> i64 {
    i64::from(u32::from(c)) - i64::from(u32::from('a'))
}

#[allow(clippy::cast_precision_loss)]
fn count(n: usize) -> f64 {
    n as f64
}

macro_rules! word_technique {
    ($(#[$doc:meta])* $name:ident, $id:literal, $ns:expr, $feature:literal, |$letters:ident| $body:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl FeatureTechnique for $name {
            fn id(&self) -> &str {
                $id
            }

            fn namespace(&self) -> &str {
                $ns
            }

            fn feature_name(&self) -> &str {
                $feature
            }

            fn calculate(&self, cog: &Cog) -> f64 {
                let $letters = letters(cog);
                $body
            }
        }
    };
}

word_technique!(
    /// `core.breadth`: spread between the highest and lowest letter.
    AlphaPolarBreadth,
    "alpha_polar_breadth",
    CORE_NAMESPACE,
    "breadth",
    |letters| {
        let indices = letters.iter().copied().map(letter_index);
        match (indices.clone().min(), indices.max()) {
            (Some(lo), Some(hi)) => {
                #[allow(clippy::cast_precision_loss)]
                let spread = (hi - lo) as f64;
                spread
            },
            _ => 0.0,
        }
    }
);

word_technique!(
    /// `core.depth`: occurrences of the most frequent letter.
    LetterDepth,
    "letter_depth",
    CORE_NAMESPACE,
    "depth",
    |letters| {
        let mut counts: BTreeMap<char, usize> = BTreeMap::new();
        for c in letters {
            *counts.entry(c).or_default() += 1;
        }
        count(counts.values().copied().max().unwrap_or(0))
    }
);

word_technique!(
    /// `core.volume`: number of letters.
    LetterVolume,
    "letter_volume",
    CORE_NAMESPACE,
    "volume",
    |letters| count(letters.len())
);

word_technique!(
    /// `shape.unique_letters`: number of distinct letters.
    ShapeUniqueLetters,
    "shape_unique_letters",
    "shape",
    "unique_letters",
    |letters| count(letters.iter().collect::<BTreeSet<_>>().len())
);

word_technique!(
    /// `shape.vowel_ratio`: share of vowels among letters, 0 when empty.
    ShapeVowelRatio,
    "shape_vowel_ratio",
    "shape",
    "vowel_ratio",
    |letters| {
        if letters.is_empty() {
            0.0
        } else {
            let vowels = letters
                .iter()
                .filter(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
                .count();
            count(vowels) / count(letters.len())
        }
    }
);

/// The core word techniques, in registration order.
#[must_use]
pub fn default_word_techniques() -> Vec<SharedTechnique> {
    vec![
        Arc::new(AlphaPolarBreadth),
        Arc::new(LetterDepth),
        Arc::new(LetterVolume),
    ]
}

/// The shape techniques, in registration order.
#[must_use]
pub fn shape_techniques() -> Vec<SharedTechnique> {
    vec![Arc::new(ShapeUniqueLetters), Arc::new(ShapeVowelRatio)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn cog(content: &str) -> Cog {
        Cog::new("c", "fallback theme").with_content(content)
    }

    #[test_case("az", 25.0; "full alphabet spread")]
    #[test_case("Bed", 3.0; "b to e")]
    #[test_case("123 !", 0.0; "no letters")]
    fn test_alpha_polar_breadth(content: &str, expected: f64) {
        assert!((AlphaPolarBreadth.calculate(&cog(content)) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_letter_depth_and_volume() {
        let c = cog("Mississippi!");
        assert!((LetterDepth.calculate(&c) - 4.0).abs() < f64::EPSILON);
        assert!((LetterVolume.calculate(&c) - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_content_reads_theme() {
        let c = Cog::new("c", "abc");
        assert!((LetterVolume.calculate(&c) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shape_techniques() {
        let c = cog("banana");
        assert!((ShapeUniqueLetters.calculate(&c) - 3.0).abs() < f64::EPSILON);
        assert!((ShapeVowelRatio.calculate(&c) - 0.5).abs() < f64::EPSILON);
        assert!(ShapeVowelRatio.calculate(&Cog::new("c", "")).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fn_technique_wraps_closure() {
        let technique = FnTechnique::new("len", "meta", "length", |cog| {
            count(cog.content.len())
        });
        assert_eq!(technique.id(), "len");
        assert_eq!(technique.namespace(), "meta");
        assert!((technique.calculate(&cog("four")) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let ids: BTreeSet<String> = default_word_techniques()
            .iter()
            .chain(shape_techniques().iter())
            .map(|t| t.id().to_string())
            .collect();
        assert_eq!(ids.len(), 5);
    }
}
