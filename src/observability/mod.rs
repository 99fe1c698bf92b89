//! Observability.
//!
//! Structured logging through `tracing-subscriber`, and counters/histograms
//! through the `metrics` facade. Metrics are no-ops until an embedding
//! application installs a recorder.
//!
//! | Metric | Kind | Labels |
//! |--------|------|--------|
//! | `cogmesh_cascade_total` | counter | |
//! | `cogmesh_cascade_pairs_rescored_total` | counter | |
//! | `cogmesh_score_sets_created_total` | counter | |
//! | `cogmesh_index_builds_total` | counter | `mode` |
//! | `cogmesh_index_cache_hits_total` | counter | |
//! | `cogmesh_graph_reorders_total` | counter | |
//! | `cogmesh_snapshots_saved_total` / `_loaded_total` | counter | |
//! | `cogmesh_tool_calls_total` | counter | `tool`, `status` |
//! | `cogmesh_tool_call_duration_ms` | histogram | `tool` |

mod logging;

pub use logging::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig};

use crate::config::CogmeshConfig;
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes logging from the loaded configuration.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or the log
/// file cannot be opened.
pub fn init_from_config(config: &CogmeshConfig, verbose: bool) -> Result<()> {
    init(&LoggingConfig::from_settings(&config.logging, verbose))
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or the log
/// file cannot be opened.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::failed(
            "observability_init",
            "observability already initialized",
        ));
    }

    let filter = || {
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    };

    match (&config.file, config.format) {
        (Some(log_file), LogFormat::Json) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true),
                )
                .with(filter())
                .try_init()
                .map_err(init_error)?;
        },
        (Some(log_file), LogFormat::Pretty) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
                .with(filter())
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true),
                )
                .with(filter())
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(io::stderr)
                        .with_target(true),
                )
                .with(filter())
                .try_init()
                .map_err(init_error)?;
        },
    }

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::failed("observability_init", "failed to mark observability initialized"))?;
    tracing::debug!(format = %config.format, level = %config.level, "Logging initialized");
    Ok(())
}

/// Thread-safe file writer for logging.
#[derive(Clone)]
struct LogFileWriter {
    file: Arc<Mutex<File>>,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Opens a log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<LogFileWriter> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::failed("create_log_dir", e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::failed("open_log_file", format!("{}: {e}", path.display())))?;
    Ok(LogFileWriter {
        file: Arc::new(Mutex::new(file)),
    })
}

#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::failed("observability_init", e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs/nested/cogmesh.log");
        let mut writer = open_log_file(&path).unwrap();
        writer.write_all(b"line\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line\n");
    }
}
