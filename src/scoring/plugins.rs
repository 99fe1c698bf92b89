//! Named feature-technique bundles.
//!
//! Resolving foreign code is left to the embedding application; it registers
//! a factory under a name and the catalog hands out the techniques.

use super::features::{SharedTechnique, default_word_techniques, shape_techniques};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type Factory = dyn Fn() -> Vec<SharedTechnique> + Send + Sync;

/// Plugin name to technique factory.
#[derive(Clone)]
pub struct PluginCatalog {
    factories: BTreeMap<String, Arc<Factory>>,
}

impl PluginCatalog {
    /// Creates a catalog holding the built-in `word_core` and `shape` bundles.
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        catalog.register("word_core", default_word_techniques);
        catalog.register("shape", shape_techniques);
        catalog
    }

    /// Creates a catalog with no bundles.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registers or replaces a bundle.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Vec<SharedTechnique> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Instantiates the techniques of a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] when no bundle has that name.
    pub fn load(&self, name: &str) -> Result<Vec<SharedTechnique>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| Error::unknown("feature plugin", name))
    }

    /// Registered bundle names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for PluginCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("names", &self.names())
            .finish()
    }
}
