//! Forward graph construction from source files

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use rayon::prelude::*;

use super::arena::{FileId, PathArena};
use crate::imports::ImportExtractor;
use crate::resolve::{package_inits, ModuleMap};

/// Parse every file and collect its imported module names.
///
/// Runs on the rayon pool with one tree-sitter parser per worker.
pub(super) fn extract_all(
    root: &Path,
    files: &BTreeSet<String>,
) -> Vec<(String, BTreeSet<String>)> {
    let _span = tracing::debug_span!("extract_all", files = files.len()).entered();

    files
        .par_iter()
        .map_init(
            || match ImportExtractor::new() {
                Ok(extractor) => Some(extractor),
                Err(e) => {
                    tracing::warn!(error = %e, "Import extractor unavailable on worker");
                    None
                }
            },
            |extractor, rel| {
                let imports = match extractor {
                    Some(ex) => ex.extract_file(&root.join(rel), rel),
                    None => BTreeSet::new(),
                };
                (rel.clone(), imports)
            },
        )
        .collect()
}

/// Resolve extracted imports into forward adjacency over `arena`.
///
/// Every tracked file gets a slot. Edges point at the resolved file and at
/// each tracked package `__init__.py` on its path; an importer never gets an
/// edge to itself.
pub(super) fn resolve_edges(
    arena: &mut PathArena,
    extracted: &[(String, BTreeSet<String>)],
    module_map: &ModuleMap,
) -> Vec<Vec<FileId>> {
    for (rel, _) in extracted {
        arena.intern(rel);
    }
    let tracked: HashSet<&str> = extracted.iter().map(|(rel, _)| rel.as_str()).collect();

    let mut forward: Vec<BTreeSet<FileId>> = vec![BTreeSet::new(); arena.len()];
    let mut unresolved = 0usize;

    for (rel, imports) in extracted {
        let mut deps: BTreeSet<&str> = BTreeSet::new();
        for module in imports {
            let Some(target) = module_map.resolve(module) else {
                unresolved += 1;
                continue;
            };
            if target == rel.as_str() || !tracked.contains(target) {
                continue;
            }
            deps.insert(target);
            for init in package_inits(target, |p| tracked.contains(p)) {
                if init != rel.as_str() {
                    if let Some(&t) = tracked.get(init.as_str()) {
                        deps.insert(t);
                    }
                }
            }
        }

        let from = arena.intern(rel);
        let edges = &mut forward[from.index()];
        for dep in deps {
            edges.insert(arena.intern(dep));
        }
    }

    tracing::debug!(unresolved, "Dropped imports with no tracked target");
    forward.into_iter().map(|s| s.into_iter().collect()).collect()
}
