//! # test-delta - Selective Test Execution
//!
//! Runs only the Python tests affected by what changed since the last green run.
//!
//! ## Features
//!
//! - **Content fingerprints**: BLAKE3-based change detection per source file
//! - **Static import graph**: tree-sitter parsing of `import` / `from ... import`,
//!   relative imports, src-layout aliases and package `__init__.py` edges
//! - **Reverse closure**: every file's full downstream set, precomputed once
//! - **conftest awareness**: a changed `conftest.py` selects every test below it
//! - **Snapshot baseline**: versioned JSON, written only after a successful run
//!
//! ## Quick Start
//!
//! ```no_run
//! use test_delta::{DeltaConfig, ExitStatus, Session, TestItem};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = DeltaConfig::load(std::path::Path::new("."))?.build()?;
//! let session = Session::configure(config);
//!
//! // Hand the collected tests to the session and run what it keeps
//! let items = vec![TestItem::new("tests/test_calc.py::test_add", "tests/test_calc.py")];
//! let selection = session.filter(items);
//! for item in &selection.selected {
//!     println!("{}", item.node_id);
//! }
//!
//! // Report the outcome; the baseline is only written on success
//! let outcome = session.finish(ExitStatus::Ok);
//! std::process::exit(outcome.exit_status.code());
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod export;
pub mod git;
pub mod graph;
pub mod hasher;
pub mod host;
pub mod impact;
pub mod imports;
pub mod resolve;
pub mod session;
pub mod snapshot;

pub use config::{ConfigBuilder, ConfigError, DeltaConfig};
pub use discovery::SourceTree;
pub use graph::{DependencyGraph, GraphMap};
pub use hasher::FileHashes;
pub use host::{ExitStatus, Selection, TestItem};
pub use impact::{ChangeSet, ImpactResolver, ReverseLookup};
pub use imports::ImportExtractor;
pub use resolve::ModuleMap;
pub use session::{
    Analysis, DeltaError, FinishOutcome, FirstRunReason, Phase, Session, SessionState,
};
pub use snapshot::{Snapshot, SnapshotError};

use std::path::Path;

/// Render a path relative to `root` with `/` separators.
///
/// Returns `None` when `path` is not inside `root`. Paths are the identity key
/// for every map in the crate, so they must look the same on every platform.
pub fn relative_key(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Directory part of a `/`-separated key, or `""` for top-level files.
pub(crate) fn parent_key(key: &str) -> &str {
    key.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// File-name part of a `/`-separated key.
pub(crate) fn file_name_key(key: &str) -> &str {
    key.rsplit_once('/').map(|(_, name)| name).unwrap_or(key)
}
