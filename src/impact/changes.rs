//! Change detection between two fingerprint maps

use std::collections::BTreeSet;

use crate::hasher::FileHashes;

/// Files that differ between the baseline and the working tree
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ChangeSet {
    /// Present in both, fingerprint differs
    pub modified: BTreeSet<String>,
    /// Present now, absent from the baseline
    pub added: BTreeSet<String>,
    /// Present in the baseline, gone now
    pub deleted: BTreeSet<String>,
}

impl ChangeSet {
    /// Compare the baseline fingerprints with the current ones
    pub fn between(baseline: &FileHashes, current: &FileHashes) -> Self {
        let mut changes = Self::default();
        for (path, hash) in current {
            match baseline.get(path) {
                None => {
                    changes.added.insert(path.clone());
                }
                Some(old) if old != hash => {
                    changes.modified.insert(path.clone());
                }
                Some(_) => {}
            }
        }
        for path in baseline.keys() {
            if !current.contains_key(path) {
                changes.deleted.insert(path.clone());
            }
        }
        changes
    }

    /// Mark extra files as modified (e.g. reported by git).
    ///
    /// Files already counted as added or deleted stay where they are.
    pub fn mark_modified<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = String>,
    {
        for path in paths {
            if !self.added.contains(&path) && !self.deleted.contains(&path) {
                self.modified.insert(path);
            }
        }
    }

    /// Union of modified, added and deleted
    pub fn all(&self) -> BTreeSet<String> {
        self.modified
            .iter()
            .chain(&self.added)
            .chain(&self.deleted)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.modified.len() + self.added.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty() && self.deleted.is_empty()
    }
}
