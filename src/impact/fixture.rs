//! Directory-scoped fixture propagation
//!
//! A fixture file (`conftest.py`) injects setup into every test below its
//! directory without being imported, so the import graph never sees it.

use std::collections::BTreeSet;

use crate::{file_name_key, parent_key};

/// Test files brought in by changed fixture files.
///
/// A root-level fixture file brings in every test; a nested one brings in
/// the tests under its directory only.
pub fn fixture_scope(
    changed: &BTreeSet<String>,
    test_files: &BTreeSet<String>,
    fixture_file: &str,
) -> BTreeSet<String> {
    let mut scoped = BTreeSet::new();
    for path in changed {
        if file_name_key(path) != fixture_file {
            continue;
        }
        let dir = parent_key(path);
        if dir.is_empty() {
            tracing::debug!(fixture = %path, "Root fixture changed, every test affected");
            return test_files.clone();
        }
        let before = scoped.len();
        scoped.extend(
            test_files
                .iter()
                .filter(|t| is_within(dir, t))
                .cloned(),
        );
        tracing::debug!(fixture = %path, tests = scoped.len() - before, "Fixture scope");
    }
    scoped
}

/// Whether `path` lies inside directory `dir` (both `/`-separated, relative).
///
/// `tests/unit` contains `tests/unit/test_a.py` but not `tests/unit_extra/test_a.py`.
pub fn is_within(dir: &str, path: &str) -> bool {
    path.strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}
