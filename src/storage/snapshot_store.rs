//! JSON snapshot files.
//!
//! # Security
//!
//! - **File size limits**: documents above [`MAX_SNAPSHOT_SIZE`] are rejected
//!   before they are read
//! - **Atomic writes**: data goes to a temporary sibling first and is renamed
//!   over the target, so readers never see a partial document
//!
//! Callers that accept paths from outside should resolve them with
//! [`crate::security::resolve_within_root`] first.

use crate::models::Snapshot;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Maximum snapshot size (64 MiB).
pub const MAX_SNAPSHOT_SIZE: u64 = 64 * 1024 * 1024;

/// Reads and writes [`Snapshot`] documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotStore;

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

impl JsonSnapshotStore {
    /// Writes `snapshot` to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when serialization or any
    /// filesystem step fails.
    #[instrument(skip(snapshot), fields(snapshot_id = %snapshot.id, path = %path.display()))]
    pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::failed("create_snapshot_dir", e))?;
        }
        let data = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| Error::failed("serialize_snapshot", e))?;

        let tmp = temp_sibling(path);
        fs::write(&tmp, &data).map_err(|e| Error::failed("write_snapshot_file", e))?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::failed("rename_snapshot_file", e));
        }

        tracing::info!(bytes = data.len(), "Saved snapshot");
        metrics::counter!("cogmesh_snapshots_saved_total").increment(1);
        Ok(())
    }

    /// Reads a snapshot from `path`.
    ///
    /// Missing optional keys take their defaults; flat feature maps are read
    /// as the `core` namespace and `scope` is accepted for `depth`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for oversized files and
    /// [`Error::OperationFailed`] for I/O or parse failures.
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Snapshot> {
        let metadata = fs::metadata(path).map_err(|e| Error::failed("read_snapshot_metadata", e))?;
        if metadata.len() > MAX_SNAPSHOT_SIZE {
            return Err(Error::InvalidInput(format!(
                "snapshot file exceeds maximum size of {MAX_SNAPSHOT_SIZE} bytes: {}",
                path.display()
            )));
        }

        let data = fs::read(path).map_err(|e| Error::failed("read_snapshot_file", e))?;
        let snapshot: Snapshot =
            serde_json::from_slice(&data).map_err(|e| Error::failed("deserialize_snapshot", e))?;

        tracing::info!(snapshot_id = %snapshot.id, cogs = snapshot.cogs.len(), "Loaded snapshot");
        metrics::counter!("cogmesh_snapshots_loaded_total").increment(1);
        Ok(snapshot)
    }

    /// A JSON Schema style description of the snapshot document.
    #[must_use]
    pub fn schema() -> Value {
        let number_map = json!({"type": "object", "additionalProperties": {"type": "number"}});
        json!({
            "title": "cogmesh snapshot",
            "type": "object",
            "required": ["id", "created_at"],
            "properties": {
                "id": {"type": "string"},
                "created_at": {"type": "string", "format": "date-time"},
                "meta": {"type": "object"},
                "cogs": {
                    "type": "object",
                    "description": "Cogs keyed by id",
                    "additionalProperties": {
                        "type": "object",
                        "required": ["id"],
                        "properties": {
                            "id": {"type": "string"},
                            "theme": {"type": "string"},
                            "breadth": {"type": "number"},
                            "depth": {"type": "number", "description": "Also read from the legacy key 'scope'"},
                            "volume": {"type": "number"},
                            "content": {"type": "string"},
                            "component_ids": {"type": "array", "items": {"type": "string"}},
                            "features": number_map,
                            "metadata": {"type": "object"},
                            "scoring": {
                                "type": "object",
                                "properties": {
                                    "feature_techniques": {
                                        "type": "object",
                                        "description": "namespace -> feature -> technique id; a flat map is read as namespace 'core'"
                                    },
                                    "feature_values": {
                                        "type": "object",
                                        "description": "namespace -> feature -> value; a flat map is read as namespace 'core'"
                                    },
                                    "metadata": {"type": "object"},
                                    "version": {"type": "integer"}
                                }
                            },
                            "version": {"type": "integer"}
                        }
                    }
                },
                "components": {
                    "type": "object",
                    "description": "Components keyed by id",
                    "additionalProperties": {
                        "type": "object",
                        "required": ["id", "kind"],
                        "properties": {
                            "id": {"type": "string"},
                            "kind": {"type": "string"},
                            "payload": {},
                            "feature_values": number_map,
                            "metadata": {"type": "object"},
                            "version": {"type": "integer"}
                        }
                    }
                },
                "graphs": {
                    "type": "object",
                    "description": "Graphs keyed by id",
                    "additionalProperties": {
                        "type": "object",
                        "required": ["id", "base_cog_id"],
                        "properties": {
                            "id": {"type": "string"},
                            "base_cog_id": {"type": "string"},
                            "adjacent_order": {"type": "array", "items": {"type": "string"}},
                            "layered_order": {"type": "array", "items": {"type": "string"}},
                            "hidden_layers": {"type": "array", "items": {"type": "integer"}},
                            "context_hash": {"type": "string"},
                            "version": {"type": "integer"}
                        }
                    }
                },
                "score_sets": {
                    "type": "object",
                    "description": "Score sets keyed by id",
                    "additionalProperties": {
                        "type": "object",
                        "required": ["id", "strategy_id"],
                        "properties": {
                            "id": {"type": "string"},
                            "strategy_id": {"type": "string"},
                            "context_hash": {"type": "string"},
                            "version": {"type": "integer"},
                            "cog_ids": {"type": "array", "items": {"type": "string"}, "description": "Present only for subset score sets"},
                            "entries": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "required": ["from_cog_id", "to_cog_id", "score"],
                                    "properties": {
                                        "from_cog_id": {"type": "string"},
                                        "to_cog_id": {"type": "string"},
                                        "score": {"type": "number"},
                                        "vector": number_map,
                                        "variance": {"type": "number"},
                                        "strategy_id": {"type": "string"}
                                    }
                                }
                            }
                        }
                    }
                },
                "lineage": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["op_type"],
                        "properties": {
                            "op_type": {
                                "type": "string",
                                "enum": ["reorder", "swap_adjacent_layered", "set_base", "set_hidden_layers", "compose", "split"]
                            },
                            "inputs": {"type": "array", "items": {"type": "string"}},
                            "outputs": {"type": "array", "items": {"type": "string"}},
                            "metadata": {"type": "object"}
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cog, CogGraph};
    use tempfile::TempDir;

    #[test]
    fn test_save_creates_parents_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshots/nested/s1.json");
        let mut snapshot = Snapshot::empty("s1");
        snapshot.cogs.insert("a".into(), Cog::new("a", "t"));
        snapshot
            .graphs
            .insert("g".to_string(), CogGraph::new("g", "a").with_hidden_layers([3, 1]));

        JsonSnapshotStore::save(&path, &snapshot).unwrap();
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let raw: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["graphs"]["g"]["hidden_layers"], json!([1, 3]));
        assert_eq!(JsonSnapshotStore::load(&path).unwrap(), snapshot);
    }

    #[test]
    fn test_load_reads_legacy_shapes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.json");
        let doc = json!({
            "id": "old",
            "created_at": "2024-01-02T03:04:05Z",
            "cogs": {
                "a": {
                    "id": "a",
                    "theme": "t",
                    "scope": 4.0,
                    "scoring": {"feature_values": {"breadth": 0.5}}
                }
            }
        });
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let snapshot = JsonSnapshotStore::load(&path).unwrap();
        let cog = &snapshot.cogs["a"];
        assert!((cog.depth - 4.0).abs() < f64::EPSILON);
        assert!((cog.scoring.feature_values["core"]["breadth"] - 0.5).abs() < f64::EPSILON);
        assert_eq!(cog.version, 1);
        assert!(snapshot.score_sets.is_empty());
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = JsonSnapshotStore::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, Error::OperationFailed { .. }));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, b"{not json").unwrap();
        assert!(matches!(
            JsonSnapshotStore::load(&bad),
            Err(Error::OperationFailed { .. })
        ));
    }

    #[test]
    fn test_schema_lists_top_level_keys() {
        let schema = JsonSnapshotStore::schema();
        let properties = schema["properties"].as_object().unwrap();
        for key in ["id", "created_at", "meta", "cogs", "components", "graphs", "score_sets", "lineage"] {
            assert!(properties.contains_key(key), "missing {key}");
        }
    }
}
