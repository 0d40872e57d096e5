//! Project root detection

use std::path::{Path, PathBuf};

/// Find the project root by walking up from `start` looking for markers.
///
/// Falls back to `start` itself when no marker is found.
pub(crate) fn find_project_root(start: &Path) -> PathBuf {
    // Priority order: if multiple exist in one directory, first match wins
    let markers = [
        "pyproject.toml", // Python (modern)
        "setup.py",       // Python (legacy)
        "setup.cfg",      // Python (declarative)
        ".git",           // Git repository root (fallback)
    ];

    let mut current = start;
    loop {
        if let Some(marker) = markers.iter().find(|m| current.join(m).exists()) {
            tracing::debug!(root = %current.display(), marker, "Found project root");
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    tracing::warn!("No project root found, using current directory");
    start.to_path_buf()
}
