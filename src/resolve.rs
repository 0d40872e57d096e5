//! Module name to file resolution
//!
//! A `ModuleMap` knows which tracked file defines which dotted module name.
//! Anything it cannot resolve is assumed to be a third-party package.

use std::collections::HashMap;

/// File name that turns a directory into a package
pub const PACKAGE_INIT: &str = "__init__.py";

/// Directory prefix that is optional in "src layout" projects
const SRC_LAYOUT_DIR: &str = "src";

/// Dotted module name -> defining file (relative path)
///
/// A file can be registered under several names; when two files claim the
/// same name, the first one registered keeps it.
#[derive(Debug, Default, Clone)]
pub struct ModuleMap {
    names: HashMap<String, String>,
}

impl ModuleMap {
    /// Build the map for a set of tracked files.
    ///
    /// Canonical names are registered first for every file, then the
    /// `src.`-less aliases, so an alias never shadows a real module. Package
    /// `__init__.py` files go before plain modules: a package directory
    /// shadows a sibling `pkg.py` on import.
    pub fn build<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut files: Vec<&String> = files.into_iter().collect();
        // Stable, so input order is kept within each group
        files.sort_by_key(|rel| crate::file_name_key(rel) != PACKAGE_INIT);
        let mut map = Self::default();

        for rel in &files {
            if let Some(name) = module_name(rel) {
                map.insert(name, rel);
            }
        }
        for rel in &files {
            if let Some(alias) = module_name(rel).and_then(|n| src_layout_alias(&n)) {
                map.insert(alias, rel);
            }
        }

        tracing::debug!(modules = map.len(), files = files.len(), "Built module map");
        map
    }

    /// Register `name` for `path` unless the name is taken.
    ///
    /// Returns whether the name was inserted.
    pub fn insert(&mut self, name: String, path: &str) -> bool {
        match self.names.entry(name) {
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(path.to_string());
                true
            }
            std::collections::hash_map::Entry::Occupied(_) => false,
        }
    }

    /// Exact lookup
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// Resolve an imported module name to the file that defines it.
    ///
    /// Tries the full name, then drops trailing segments one at a time
    /// (`a.b.c` -> `a.b` -> `a`). The shorter forms catch symbols imported
    /// from a module and submodules that are not tracked on their own.
    pub fn resolve(&self, module: &str) -> Option<&str> {
        let mut name = module;
        loop {
            if let Some(path) = self.get(name) {
                return Some(path);
            }
            name = name.rsplit_once('.')?.0;
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Dotted module name for a relative `.py` path.
///
/// `pkg/sub/mod.py` is `pkg.sub.mod`; `pkg/sub/__init__.py` is `pkg.sub`.
/// A top-level `__init__.py` names no module.
pub fn module_name(rel_path: &str) -> Option<String> {
    let stem = rel_path.strip_suffix(".py")?;
    let mut parts: Vec<&str> = stem.split('/').collect();
    if parts.last() == Some(&"__init__") {
        parts.pop();
    }
    if parts.is_empty() || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts.join("."))
}

/// `src.pkg.mod` -> `pkg.mod`
fn src_layout_alias(name: &str) -> Option<String> {
    let rest = name.strip_prefix(SRC_LAYOUT_DIR)?.strip_prefix('.')?;
    Some(rest.to_string())
}

/// Package aggregator files along the directories of `resolved`.
///
/// For `a/b/c.py` this is whichever of `a/__init__.py` and `a/b/__init__.py`
/// is tracked, outermost first.
pub fn package_inits<F>(resolved: &str, is_tracked: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let dirs: Vec<&str> = resolved.split('/').collect();
    let mut inits = Vec::new();
    for depth in 1..dirs.len() {
        let candidate = format!("{}/{}", dirs[..depth].join("/"), PACKAGE_INIT);
        if is_tracked(&candidate) {
            inits.push(candidate);
        }
    }
    inits
}
