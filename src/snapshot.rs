//! Persisted baseline: fingerprints plus both graph directions
//!
//! Stored as a single JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "file_hashes": { "pkg/mod.py": "9f2c..." },
//!   "graph": {
//!     "forward": { "pkg/mod.py": ["pkg/util.py"] },
//!     "reverse": { "pkg/util.py": ["pkg/mod.py"] }
//!   }
//! }
//! ```
//!
//! Maps are `BTreeMap`/`BTreeSet`, so every list is written sorted and the file
//! diffs cleanly. A snapshot is only ever written after a successful run.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{DependencyGraph, GraphMap};
use crate::hasher::FileHashes;

/// Newest schema this build reads and the one it writes
pub const SCHEMA_VERSION: u32 = 1;

/// Default snapshot file name, relative to the project root
pub const DEFAULT_SNAPSHOT_FILE: &str = ".delta-snapshot.json";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot is corrupt: {0}")]
    Corrupt(String),
    #[error("snapshot schema version {found} is newer than supported version {supported}")]
    VersionTooNew { found: u64, supported: u32 },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Forward and reverse graph as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub forward: GraphMap,
    #[serde(default)]
    pub reverse: GraphMap,
}

/// The baseline from the last successful run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub file_hashes: FileHashes,
    #[serde(default)]
    pub graph: GraphSnapshot,
}

impl Snapshot {
    /// Snapshot of the given fingerprints and graph at the current schema.
    pub fn new(file_hashes: FileHashes, graph: &DependencyGraph) -> Self {
        Self {
            version: SCHEMA_VERSION,
            file_hashes,
            graph: GraphSnapshot {
                forward: graph.forward_map(),
                reverse: graph.reverse_map(),
            },
        }
    }

    /// Load the snapshot at `path`.
    ///
    /// `Ok(None)` when no snapshot exists yet. Corrupt files and files written
    /// by a newer schema are errors; the caller decides how to degrade.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SnapshotError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let snapshot = Self::from_json(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            files = snapshot.file_hashes.len(),
            "Loaded snapshot"
        );
        Ok(Some(snapshot))
    }

    /// Decode a snapshot, checking the schema version before the payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| SnapshotError::Corrupt(e.to_string()))?;
        if !value.is_object() {
            return Err(SnapshotError::Corrupt("top level is not an object".into()));
        }

        // Missing version means a pre-versioned file
        let found = match value.get("version") {
            None => 0,
            Some(v) => v
                .as_u64()
                .ok_or_else(|| SnapshotError::Corrupt(format!("invalid version field: {v}")))?,
        };
        if found > u64::from(SCHEMA_VERSION) {
            return Err(SnapshotError::VersionTooNew {
                found,
                supported: SCHEMA_VERSION,
            });
        }

        let mut snapshot: Self = serde_json::from_value(value)
            .map_err(|e| SnapshotError::Corrupt(format!("payload does not match schema: {e}")))?;
        snapshot.version = found as u32;
        Ok(snapshot)
    }

    /// Pretty JSON encoding
    pub fn to_json(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write atomically: temp file in the target directory, then rename over
    /// `path`. Missing parent directories are created.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let _span = tracing::debug_span!("snapshot_save", path = %path.display()).entered();
        let io_err = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };

        let bytes = self.to_json()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        tracing::debug!(
            files = self.file_hashes.len(),
            bytes = bytes.len(),
            "Snapshot written"
        );
        Ok(())
    }
}
