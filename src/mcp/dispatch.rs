//! Tool call dispatch.
//!
//! ```text
//! ToolDispatcher::dispatch(name, arguments)
//!   ├── look up the tool             (unknown → UnknownReference)
//!   ├── strip manager_service / workspace_id
//!   ├── RuntimeRegistry::runtime     (created on first use)
//!   └── ToolRegistry::execute
//! ```

use super::runtime::{InteractionScope, RuntimeRegistry};
use super::tools::{ToolRegistry, ToolResult};
use crate::config::CogmeshConfig;
use crate::{Error, Result};
use serde_json::Value;
use std::time::Instant;
use tracing::instrument;

/// Scope keys accepted by every tool.
const SCOPE_KEYS: [&str; 2] = ["manager_service", "workspace_id"];

/// Routes tool calls to the runtime of their scope.
pub struct ToolDispatcher {
    registry: ToolRegistry,
    runtimes: RuntimeRegistry,
}

impl ToolDispatcher {
    /// Creates a dispatcher with every tool and no live runtimes.
    #[must_use]
    pub fn new(config: &CogmeshConfig) -> Self {
        Self {
            registry: ToolRegistry::new(),
            runtimes: RuntimeRegistry::new(config),
        }
    }

    /// The tool definitions.
    #[must_use]
    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The workspace runtimes.
    pub const fn runtimes(&mut self) -> &mut RuntimeRegistry {
        &mut self.runtimes
    }

    /// Runs one tool call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown tool,
    /// [`Error::InvalidInput`] for malformed arguments or scope, otherwise the
    /// handler's error.
    #[instrument(skip(self, arguments), fields(tool = %name))]
    pub fn dispatch(&mut self, name: &str, arguments: Value) -> Result<ToolResult> {
        if self.registry.get_tool(name).is_none() {
            return Err(Error::unknown("tool", name));
        }
        let (scope, arguments) = self.split_scope(arguments)?;
        let runtime = self.runtimes.runtime(&scope);
        self.registry.execute(runtime, name, arguments)
    }

    /// Runs one tool call, folding errors into an error result.
    pub fn call(&mut self, name: &str, arguments: Value) -> ToolResult {
        let start = Instant::now();
        let outcome = self.dispatch(name, arguments);
        let status = if outcome.is_ok() { "success" } else { "error" };

        metrics::counter!("cogmesh_tool_calls_total", "tool" => name.to_string(), "status" => status)
            .increment(1);
        metrics::histogram!("cogmesh_tool_call_duration_ms", "tool" => name.to_string())
            .record(start.elapsed().as_secs_f64() * 1000.0);

        outcome.unwrap_or_else(|e| {
            tracing::warn!(tool = name, error = %e, "Tool call failed");
            ToolResult::error(e.to_string())
        })
    }

    /// Removes the scope keys from `arguments` and resolves the scope.
    fn split_scope(&self, arguments: Value) -> Result<(InteractionScope, Value)> {
        let mut object = match arguments {
            Value::Null => serde_json::Map::new(),
            Value::Object(object) => object,
            other => {
                return Err(Error::InvalidInput(format!(
                    "tool arguments must be a JSON object, got {other}"
                )));
            },
        };

        let mut parts = [None, None];
        for (slot, key) in parts.iter_mut().zip(SCOPE_KEYS) {
            *slot = match object.remove(key) {
                None | Some(Value::Null) => None,
                Some(Value::String(value)) => Some(value),
                Some(other) => {
                    return Err(Error::InvalidInput(format!("{key} must be a string, got {other}")));
                },
            };
        }
        let [manager_service, workspace_id] = parts;
        let scope = self
            .runtimes
            .scope(manager_service.as_deref(), workspace_id.as_deref())?;
        Ok((scope, Value::Object(object)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(&CogmeshConfig::new().with_data_root("/data"))
    }

    #[test]
    fn test_scope_keys_select_runtime() {
        let mut dispatcher = dispatcher();
        dispatcher
            .dispatch("cog.add", json!({"id": "a", "workspace_id": "one"}))
            .unwrap();
        let result = dispatcher
            .dispatch("runtime.info", json!({"workspace_id": "two"}))
            .unwrap();
        let info: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();

        assert_eq!(info["workspace_id"], "two");
        assert_eq!(info["counts"]["cogs"], 0);
        assert_eq!(dispatcher.runtimes().known_scopes().len(), 2);
    }

    #[test]
    fn test_unknown_tool_is_rejected_before_scope() {
        let mut dispatcher = dispatcher();
        let err = dispatcher
            .dispatch("nope", json!({"workspace_id": "../x"}))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownReference { .. }));
        assert!(dispatcher.runtimes().known_scopes().is_empty());
    }

    #[test]
    fn test_bad_scope_and_argument_shapes() {
        let mut dispatcher = dispatcher();
        assert!(matches!(
            dispatcher.dispatch("runtime.info", json!({"workspace_id": "a/b"})),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            dispatcher.dispatch("runtime.info", json!({"workspace_id": 3})),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            dispatcher.dispatch("runtime.info", json!([1, 2])),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_call_folds_errors() {
        let mut dispatcher = dispatcher();
        let result = dispatcher.call("cog.update", json!({"cog_id": "missing", "fields": {}}));
        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains("missing"));
    }
}
