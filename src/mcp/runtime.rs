//! Workspace-scoped runtimes.
//!
//! Every tool call runs against one [`WorkspaceRuntime`], selected by the
//! `(manager_service, workspace_id)` pair of the call. Runtimes are created on
//! first use and cached for the life of the [`RuntimeRegistry`]; nothing is
//! shared between them.

use crate::config::CogmeshConfig;
use crate::security::is_safe_segment;
use crate::services::CogSystem;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Workspace used when a call names none.
pub const DEFAULT_WORKSPACE_ID: &str = "default";

/// Owner and workspace of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InteractionScope {
    /// Service that owns the workspace.
    pub manager_service: String,
    /// Workspace within the service.
    pub workspace_id: String,
}

impl InteractionScope {
    /// Creates a scope after checking both parts are safe path segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when either part is empty or contains
    /// path separators or other unsafe characters.
    pub fn new(manager_service: impl Into<String>, workspace_id: impl Into<String>) -> Result<Self> {
        let scope = Self {
            manager_service: manager_service.into(),
            workspace_id: workspace_id.into(),
        };
        for (field, value) in [
            ("manager_service", &scope.manager_service),
            ("workspace_id", &scope.workspace_id),
        ] {
            if !is_safe_segment(value) {
                return Err(Error::InvalidInput(format!(
                    "{field} '{value}' must be a single path segment of letters, digits, '-', '_' or '.'"
                )));
            }
        }
        Ok(scope)
    }

    /// Cache key, `manager_service:workspace_id`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.manager_service, self.workspace_id)
    }
}

impl fmt::Display for InteractionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One isolated system plus its storage root.
#[derive(Debug)]
pub struct WorkspaceRuntime {
    /// The owning scope.
    pub scope: InteractionScope,
    /// `<data_root>/<manager_service>/<workspace_id>`.
    pub storage_root: PathBuf,
    /// The workspace state.
    pub system: CogSystem,
    /// Id of the snapshot most recently saved or loaded.
    pub active_snapshot_id: Option<String>,
}

impl WorkspaceRuntime {
    /// Creates an empty runtime, optionally with the core word techniques.
    #[must_use]
    pub fn new(scope: InteractionScope, storage_root: PathBuf, register_default_techniques: bool) -> Self {
        let mut system = CogSystem::new();
        if register_default_techniques {
            system.register_default_word_feature_techniques();
        }
        Self {
            scope,
            storage_root,
            system,
            active_snapshot_id: None,
        }
    }
}

/// Lazily created runtimes keyed by scope.
#[derive(Debug)]
pub struct RuntimeRegistry {
    data_root: PathBuf,
    default_manager_service: String,
    register_default_techniques: bool,
    runtimes: BTreeMap<String, WorkspaceRuntime>,
}

impl RuntimeRegistry {
    /// Creates a registry from the loaded configuration.
    #[must_use]
    pub fn new(config: &CogmeshConfig) -> Self {
        Self {
            data_root: config.data_root.clone(),
            default_manager_service: config.manager_service.clone(),
            register_default_techniques: config.register_default_techniques,
            runtimes: BTreeMap::new(),
        }
    }

    /// Root under which workspaces are stored.
    #[must_use]
    pub const fn data_root(&self) -> &PathBuf {
        &self.data_root
    }

    /// Builds the scope of a call, filling in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unsafe scope segments.
    pub fn scope(&self, manager_service: Option<&str>, workspace_id: Option<&str>) -> Result<InteractionScope> {
        InteractionScope::new(
            manager_service.unwrap_or(&self.default_manager_service),
            workspace_id.unwrap_or(DEFAULT_WORKSPACE_ID),
        )
    }

    /// Returns the runtime of `scope`, creating it on first use.
    pub fn runtime(&mut self, scope: &InteractionScope) -> &mut WorkspaceRuntime {
        let data_root = &self.data_root;
        let register = self.register_default_techniques;
        self.runtimes.entry(scope.key()).or_insert_with(|| {
            let storage_root = data_root
                .join(&scope.manager_service)
                .join(&scope.workspace_id);
            tracing::info!(scope = %scope, root = %storage_root.display(), "Created workspace runtime");
            WorkspaceRuntime::new(scope.clone(), storage_root, register)
        })
    }

    /// Scopes with a live runtime, ordered by key.
    #[must_use]
    pub fn known_scopes(&self) -> Vec<&InteractionScope> {
        self.runtimes.values().map(|runtime| &runtime.scope).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn registry() -> RuntimeRegistry {
        RuntimeRegistry::new(&CogmeshConfig::new().with_data_root("/data"))
    }

    #[test]
    fn test_scope_defaults_and_key() {
        let registry = registry();
        let scope = registry.scope(None, None).unwrap();
        assert_eq!(scope.key(), "cogmesh:default");
        let scope = registry.scope(Some("billing"), Some("ws-1")).unwrap();
        assert_eq!(scope.to_string(), "billing:ws-1");
    }

    #[test]
    fn test_scope_rejects_unsafe_segments() {
        let registry = registry();
        assert!(registry.scope(Some("../etc"), None).is_err());
        assert!(registry.scope(None, Some("a/b")).is_err());
        assert!(registry.scope(None, Some("")).is_err());
    }

    #[test]
    fn test_runtimes_are_cached_and_isolated() {
        let mut registry = registry();
        let a = registry.scope(None, Some("a")).unwrap();
        let b = registry.scope(None, Some("b")).unwrap();

        registry
            .runtime(&a)
            .system
            .add_cog(crate::models::Cog::new("x", "t"))
            .unwrap();
        assert_eq!(registry.runtime(&a).system.counts()["cogs"], 1);
        assert_eq!(registry.runtime(&b).system.counts()["cogs"], 0);
        assert_eq!(registry.runtime(&a).storage_root, Path::new("/data/cogmesh/a"));
        assert_eq!(registry.known_scopes().len(), 2);
        assert_eq!(registry.runtime(&a).system.counts()["feature_techniques"], 3);
    }
}
