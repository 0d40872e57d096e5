//! Impact resolution
//!
//! Maps a set of changed files to the tests that need to run:
//! reverse-closure expansion, fixture propagation, then intersection with
//! the known test files.

mod changes;
mod fixture;

pub use changes::ChangeSet;
pub use fixture::{fixture_scope, is_within};

use std::collections::BTreeSet;

use crate::graph::{DependencyGraph, GraphMap};
use crate::hasher::FileHashes;

/// Default fixture file name
pub const DEFAULT_FIXTURE_FILE: &str = "conftest.py";

/// Anything that can answer "who depends on this file, transitively?"
///
/// Implemented by the live graph and by the reverse map loaded from a
/// snapshot, so deleted files can still be traced through the baseline.
pub trait ReverseLookup {
    /// All files that depend on `path`; empty for unknown paths
    fn dependents_of(&self, path: &str) -> Vec<&str>;
}

impl ReverseLookup for DependencyGraph {
    fn dependents_of(&self, path: &str) -> Vec<&str> {
        self.dependents(path)
    }
}

impl ReverseLookup for GraphMap {
    fn dependents_of(&self, path: &str) -> Vec<&str> {
        self.get(path)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Impact closure: the changed files plus everything that depends on them.
///
/// An empty change set has an empty closure.
pub fn affected<R>(changed: &BTreeSet<String>, reverse: &R) -> BTreeSet<String>
where
    R: ReverseLookup + ?Sized,
{
    let mut result = changed.clone();
    for path in changed {
        result.extend(reverse.dependents_of(path).into_iter().map(str::to_string));
    }
    result
}

/// Turns changes into a test selection for one project
pub struct ImpactResolver<'a> {
    /// Every test file currently tracked
    test_files: &'a BTreeSet<String>,
    /// File name of directory-scoped fixture files
    fixture_file: &'a str,
}

impl<'a> ImpactResolver<'a> {
    pub fn new(test_files: &'a BTreeSet<String>, fixture_file: &'a str) -> Self {
        Self {
            test_files,
            fixture_file,
        }
    }

    /// Affected files: impact closure plus fixture-scoped tests
    pub fn affected<R>(&self, changed: &BTreeSet<String>, reverse: &R) -> BTreeSet<String>
    where
        R: ReverseLookup + ?Sized,
    {
        let mut result = affected(changed, reverse);
        result.extend(fixture_scope(changed, self.test_files, self.fixture_file));
        result
    }

    /// Tests to run: affected test files plus test files the baseline has
    /// never seen.
    pub fn select(&self, affected: &BTreeSet<String>, baseline: &FileHashes) -> BTreeSet<String> {
        self.test_files
            .iter()
            .filter(|t| affected.contains(*t) || !baseline.contains_key(*t))
            .cloned()
            .collect()
    }
}
