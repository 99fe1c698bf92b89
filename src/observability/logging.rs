//! Logging configuration.

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default filter directive when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable multi-line output.
    #[default]
    Pretty,
}

impl LogFormat {
    /// Returns the format name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }

    /// Parses a format name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for anything other than `json`
    /// or `pretty`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(Error::InvalidConfiguration(format!(
                "unsupported log format '{other}' (expected json or pretty)"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional file to append to instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds the logging configuration from file/env settings. `verbose`
    /// raises the level to `debug` when no level is configured.
    ///
    /// An unknown format falls back to pretty output with a warning.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let level = settings.level.clone().unwrap_or_else(|| {
            if verbose { "debug" } else { DEFAULT_LOG_LEVEL }.to_string()
        });
        let format = settings
            .format
            .as_deref()
            .map_or(Ok(LogFormat::default()), LogFormat::parse)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to pretty log format");
                LogFormat::Pretty
            });
        Self {
            level,
            format,
            file: settings.file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("json", LogFormat::Json; "json")]
    #[test_case("PRETTY", LogFormat::Pretty; "uppercase pretty")]
    #[test_case("text", LogFormat::Pretty; "text alias")]
    fn test_parse_format(input: &str, expected: LogFormat) {
        assert_eq!(LogFormat::parse(input).unwrap(), expected);
    }

    #[test]
    fn test_from_settings() {
        let config = LoggingConfig::from_settings(&LoggingSettings::default(), true);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Pretty);

        let settings = LoggingSettings {
            level: Some("cogmesh=trace".to_string()),
            format: Some("yaml".to_string()),
            file: Some(PathBuf::from("x.log")),
        };
        let config = LoggingConfig::from_settings(&settings, false);
        assert_eq!(config.level, "cogmesh=trace");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.file, Some(PathBuf::from("x.log")));
    }
}
