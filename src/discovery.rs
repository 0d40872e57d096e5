//! Source file discovery
//!
//! Walks a project root and yields every tracked Python file as a
//! `/`-separated path relative to the root.

use std::collections::BTreeSet;
use std::path::PathBuf;

use globset::GlobSet;
use ignore::WalkBuilder;

/// Extension of tracked source files
pub const SOURCE_EXTENSION: &str = "py";

/// Directories whose whole subtree is never tracked.
///
/// Hidden directories (leading `.`) are pruned as well, whether listed or not.
pub const SKIP_DIRS: &[&str] = &[
    ".venv",
    "venv",
    ".env",
    "env",
    "__pycache__",
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "build",
    "dist",
    ".eggs",
    ".tox",
    ".nox",
    ".mypy_cache",
    ".ruff_cache",
    ".pytest_cache",
    "site-packages",
];

/// Whether a directory name prunes its subtree
pub fn is_pruned_dir(name: &str) -> bool {
    name.starts_with('.') || SKIP_DIRS.contains(&name)
}

/// A project tree to scan for source files
///
/// Symlinks are not followed into directories, so link cycles cannot trap
/// the walk. Unreadable entries are skipped.
pub struct SourceTree {
    /// Project root; all keys are relative to it
    root: PathBuf,
    /// User-supplied exclusions, matched against the relative path
    ignore: GlobSet,
    /// Also honour `.gitignore` / `.git/info/exclude`
    respect_gitignore: bool,
}

impl SourceTree {
    /// Create a source tree rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: GlobSet::empty(),
            respect_gitignore: false,
        }
    }

    /// Exclude paths matching any of these globs
    pub fn with_ignore(mut self, ignore: GlobSet) -> Self {
        self.ignore = ignore;
        self
    }

    /// Honour git ignore files during the walk
    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Enumerate tracked source files, sorted
    pub fn discover(&self) -> BTreeSet<String> {
        let _span = tracing::debug_span!("discover", root = %self.root.display()).entered();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .filter_entry(|entry| {
                // The root itself may well be hidden (temp dirs are)
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir && is_pruned_dir(&entry.file_name().to_string_lossy()))
            });

        let mut files = BTreeSet::new();
        let mut skipped = 0usize;

        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    skipped += 1;
                    tracing::debug!(error = %e, "Skipping unreadable path");
                    continue;
                }
            };

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
                continue;
            }

            let is_file = match entry.file_type() {
                Some(t) if t.is_file() => true,
                // A symlink to a regular file is tracked under the link's name
                Some(t) if t.is_symlink() => path.is_file(),
                _ => false,
            };
            if !is_file {
                continue;
            }

            let Some(rel) = crate::relative_key(path, &self.root) else {
                continue;
            };
            if self.ignore.is_match(&rel) {
                tracing::trace!(file = %rel, "Ignored by glob");
                continue;
            }
            files.insert(rel);
        }

        if skipped > 0 {
            tracing::debug!(skipped, "Some paths could not be read during discovery");
        }
        tracing::debug!(files = files.len(), "Discovered source files");
        files
    }
}
