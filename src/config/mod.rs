//! Configuration management.
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file and `COGMESH_*` environment variables.
//!
//! ```toml
//! data_root = "/var/lib/cogmesh"
//! manager_service = "cogmesh"
//! register_default_techniques = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//! file = "/var/log/cogmesh.log"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding [`CogmeshConfig::data_root`].
pub const ENV_DATA_ROOT: &str = "COGMESH_DATA_ROOT";
/// Environment variable overriding [`CogmeshConfig::manager_service`].
pub const ENV_MANAGER_SERVICE: &str = "COGMESH_MANAGER_SERVICE";
/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "COGMESH_LOG_FORMAT";
/// Environment variable overriding the log file.
pub const ENV_LOG_FILE: &str = "COGMESH_LOG_FILE";
/// Environment variable holding a log filter directive.
pub const ENV_LOG: &str = "COGMESH_LOG";

/// Main configuration for cogmesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CogmeshConfig {
    /// Root under which every workspace gets `<manager_service>/<workspace_id>`.
    pub data_root: PathBuf,
    /// Manager service used when a tool call names none.
    pub manager_service: String,
    /// Register the core word techniques in every new workspace.
    pub register_default_techniques: bool,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Filter directive such as `info` or `cogmesh=debug`.
    pub level: Option<String>,
    /// Output format: `json` or `pretty`.
    pub format: Option<String>,
    /// Optional file to append log lines to.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data root.
    pub data_root: Option<String>,
    /// Default manager service.
    pub manager_service: Option<String>,
    /// Register default techniques.
    pub register_default_techniques: Option<bool>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

impl Default for CogmeshConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data/cogmesh"),
            manager_service: "cogmesh".to_string(),
            register_default_techniques: true,
            logging: LoggingSettings::default(),
        }
    }
}

impl CogmeshConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::failed("read_config_file", format!("{}: {e}", path.display())))?;
        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::failed("parse_config_file", e))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the platform config dir
    /// (`<config_dir>/cogmesh/config.toml`).
    ///
    /// Returns the default configuration if no file is found or it fails to
    /// parse.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("cogmesh").join("config.toml");
        if !platform_config.exists() {
            return Self::default();
        }
        match Self::load_from_file(&platform_config) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %platform_config.display(),
                    error = %e,
                    "Ignoring unreadable config file"
                );
                Self::default()
            },
        }
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();
        if let Some(data_root) = file.data_root {
            config.data_root = PathBuf::from(data_root);
        }
        if let Some(manager_service) = file.manager_service {
            config.manager_service = manager_service;
        }
        if let Some(register) = file.register_default_techniques {
            config.register_default_techniques = register;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        config
    }

    /// Applies `COGMESH_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies `COGMESH_*` overrides read through `lookup`. Empty values are
    /// ignored.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(data_root) = get(ENV_DATA_ROOT) {
            self.data_root = PathBuf::from(data_root);
        }
        if let Some(manager_service) = get(ENV_MANAGER_SERVICE) {
            self.manager_service = manager_service;
        }
        if let Some(format) = get(ENV_LOG_FORMAT) {
            self.logging.format = Some(format);
        }
        if let Some(file) = get(ENV_LOG_FILE) {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(level) = get(ENV_LOG) {
            self.logging.level = Some(level);
        }
        self
    }

    /// Sets the data root.
    #[must_use]
    pub fn with_data_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_root = path.into();
        self
    }

    /// Sets the default manager service.
    #[must_use]
    pub fn with_manager_service(mut self, manager_service: impl Into<String>) -> Self {
        self.manager_service = manager_service.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = CogmeshConfig::new();
        assert_eq!(config.manager_service, "cogmesh");
        assert!(config.register_default_techniques);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_root = "/srv/cogmesh"
register_default_techniques = false

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = CogmeshConfig::load_from_file(&path).unwrap();
        assert_eq!(config.data_root, PathBuf::from("/srv/cogmesh"));
        assert_eq!(config.manager_service, "cogmesh");
        assert!(!config.register_default_techniques);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "colour = \"blue\"\n").unwrap();
        assert!(CogmeshConfig::load_from_file(&path).is_err());
        assert!(CogmeshConfig::load_from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DATA_ROOT, "/tmp/cm"),
            (ENV_MANAGER_SERVICE, "svc"),
            (ENV_LOG_FORMAT, "pretty"),
            (ENV_LOG_FILE, ""),
        ]);
        let config = CogmeshConfig::new()
            .with_overrides_from(|key| env.get(key).map(|v| (*v).to_string()));
        assert_eq!(config.data_root, PathBuf::from("/tmp/cm"));
        assert_eq!(config.manager_service, "svc");
        assert_eq!(config.logging.format.as_deref(), Some("pretty"));
        assert!(config.logging.file.is_none());
    }
}
