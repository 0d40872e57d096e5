//! File-level dependency graph
//!
//! Split into submodules:
//! - `arena`: path interning to dense ids
//! - `build`: import extraction and edge resolution
//! - `closure`: reverse edges and transitive closure
//!
//! The graph is rebuilt wholesale on every analysis pass; nothing is patched
//! in place.

mod arena;
mod build;
mod closure;

pub use arena::{FileId, PathArena};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::resolve::ModuleMap;

/// Path -> set of paths, the serialized shape of both graph directions
pub type GraphMap = BTreeMap<String, BTreeSet<String>>;

/// Forward imports plus the precomputed reverse closure
///
/// `dependencies(x)` are the files `x` imports directly.
/// `dependents(x)` are all files that import `x`, directly or transitively.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    arena: PathArena,
    forward: Vec<Vec<FileId>>,
    reverse: Vec<Vec<FileId>>,
}

impl DependencyGraph {
    /// Parse `files` under `root` and build the graph.
    pub fn build(root: &Path, files: &BTreeSet<String>, module_map: &ModuleMap) -> Self {
        let _span = tracing::info_span!("build_graph", files = files.len()).entered();

        let extracted = build::extract_all(root, files);
        let mut arena = PathArena::new();
        let forward = build::resolve_edges(&mut arena, &extracted, module_map);
        let graph = Self::from_parts(arena, forward);

        tracing::debug!(
            files = graph.len(),
            edges = graph.edge_count(),
            "Dependency graph built"
        );
        graph
    }

    /// Build from an explicit forward map.
    ///
    /// Targets missing as keys are added as files with no imports. Self
    /// edges are dropped.
    pub fn from_forward(forward: &GraphMap) -> Self {
        let mut arena = PathArena::new();
        for (file, deps) in forward {
            arena.intern(file);
            for dep in deps {
                arena.intern(dep);
            }
        }

        let mut adjacency = vec![Vec::new(); arena.len()];
        for (file, deps) in forward {
            let from = arena.intern(file);
            let edges: &mut Vec<FileId> = &mut adjacency[from.index()];
            for dep in deps {
                let to = arena.intern(dep);
                if to != from {
                    edges.push(to);
                }
            }
            edges.sort_unstable();
            edges.dedup();
        }

        Self::from_parts(arena, adjacency)
    }

    fn from_parts(arena: PathArena, forward: Vec<Vec<FileId>>) -> Self {
        let reverse = closure::transitive_closure(&closure::invert(&forward));
        Self {
            arena,
            forward,
            reverse,
        }
    }

    /// Number of files in the graph
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Number of direct import edges
    pub fn edge_count(&self) -> usize {
        self.forward.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.arena.get(path).is_some()
    }

    /// All files, in interning order
    pub fn files(&self) -> impl Iterator<Item = &str> + '_ {
        self.arena.ids().map(|id| self.arena.path(id))
    }

    /// Files `path` imports directly
    pub fn dependencies(&self, path: &str) -> Vec<&str> {
        self.lookup(&self.forward, path)
    }

    /// Files that import `path`, directly or transitively
    pub fn dependents(&self, path: &str) -> Vec<&str> {
        self.lookup(&self.reverse, path)
    }

    fn lookup(&self, table: &[Vec<FileId>], path: &str) -> Vec<&str> {
        match self.arena.get(path) {
            Some(id) => table[id.index()]
                .iter()
                .map(|&d| self.arena.path(d))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Forward graph as a path map (every file present, possibly empty)
    pub fn forward_map(&self) -> GraphMap {
        self.to_map(&self.forward)
    }

    /// Reverse closure as a path map (every file present, possibly empty)
    pub fn reverse_map(&self) -> GraphMap {
        self.to_map(&self.reverse)
    }

    fn to_map(&self, table: &[Vec<FileId>]) -> GraphMap {
        self.arena
            .ids()
            .map(|id| {
                let targets = table[id.index()]
                    .iter()
                    .map(|&d| self.arena.path(d).to_string())
                    .collect();
                (self.arena.path(id).to_string(), targets)
            })
            .collect()
    }
}
