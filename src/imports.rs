//! Static import extraction with tree-sitter
//!
//! Turns a Python source file into the set of dotted module names it imports.
//! Relative imports are resolved against the file's own package, so every
//! name returned is absolute with respect to the project root.
//!
//! Extraction is best-effort: unreadable files, non-UTF-8 content and syntax
//! errors all yield an empty set.

use std::collections::BTreeSet;
use std::path::Path;

use thiserror::Error;
use tree_sitter::Node;

/// Errors constructing an extractor
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Grammar and tree-sitter runtime disagree on ABI version
    #[error("Failed to load Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
}

/// Import extractor holding a reusable tree-sitter parser
///
/// Parsers are not shareable across threads; create one per worker.
pub struct ImportExtractor {
    parser: tree_sitter::Parser,
}

impl ImportExtractor {
    /// Create an extractor for Python sources
    pub fn new() -> Result<Self, ExtractError> {
        let mut parser = tree_sitter::Parser::new();
        let grammar: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        parser.set_language(&grammar)?;
        Ok(Self { parser })
    }

    /// Extract imports from a file on disk.
    ///
    /// `rel_path` is the file's `/`-separated path relative to the project
    /// root; it anchors relative imports.
    pub fn extract_file(&mut self, path: &Path, rel_path: &str) -> BTreeSet<String> {
        match std::fs::read_to_string(path) {
            Ok(source) => self.extract_source(&source, rel_path),
            Err(e) => {
                tracing::debug!(file = %rel_path, error = %e, "Unreadable source, no imports");
                BTreeSet::new()
            }
        }
    }

    /// Extract imports from source text.
    pub fn extract_source(&mut self, source: &str, rel_path: &str) -> BTreeSet<String> {
        let Some(tree) = self.parser.parse(source, None) else {
            tracing::debug!(file = %rel_path, "Parser produced no tree");
            return BTreeSet::new();
        };
        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(file = %rel_path, "Syntax error, no imports");
            return BTreeSet::new();
        }

        let src = source.as_bytes();
        let package = package_parts(rel_path);
        let mut imports = BTreeSet::new();

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "import_statement" => collect_plain(node, src, &mut imports),
                "import_from_statement" => collect_from(node, src, &package, &mut imports),
                // `from __future__ import x` never names a project module
                "future_import_statement" => {}
                _ => {
                    let mut cursor = node.walk();
                    stack.extend(node.named_children(&mut cursor));
                }
            }
        }

        imports
    }
}

/// `import a.b, c as d`
fn collect_plain(node: Node, src: &[u8], out: &mut BTreeSet<String>) {
    for name in field_children(node, "name") {
        if let Some(dotted) = imported_name(name, src) {
            out.insert(dotted);
        }
    }
}

/// `from m import a, b` / `from ..m import a` / `from . import a`
fn collect_from(node: Node, src: &[u8], package: &[&str], out: &mut BTreeSet<String>) {
    let Some(module) = node.child_by_field_name("module_name") else {
        return;
    };

    // Segments the statement is anchored at, before member names
    let base: Vec<String> = match module.kind() {
        "relative_import" => {
            let mut level = 0;
            let mut target = None;
            let mut cursor = module.walk();
            for child in module.named_children(&mut cursor) {
                match child.kind() {
                    "import_prefix" => {
                        level = child
                            .utf8_text(src)
                            .map(|t| t.chars().filter(|c| *c == '.').count())
                            .unwrap_or(0);
                    }
                    "dotted_name" => target = dotted_text(child, src),
                    _ => {}
                }
            }
            match relative_base(package, level) {
                Some(mut prefix) => {
                    if let Some(target) = target {
                        prefix.extend(target.split('.').map(str::to_string));
                    }
                    prefix
                }
                // Climbs above the project root
                None => return,
            }
        }
        _ => match dotted_text(module, src) {
            Some(name) => name.split('.').map(str::to_string).collect(),
            None => return,
        },
    };

    if !base.is_empty() {
        out.insert(base.join("."));
    }

    // Members may themselves be submodules; the resolver strips them back to
    // the module when they are not
    for name in field_children(node, "name") {
        if let Some(member) = imported_name(name, src) {
            let mut full = base.clone();
            full.push(member);
            out.insert(full.join("."));
        }
    }
}

/// Package segments a relative import of `level` dots starts from.
///
/// Level 1 is the file's own package; every extra dot drops one trailing
/// segment. Returns `None` when the import climbs above the project root.
pub fn relative_base(package: &[&str], level: usize) -> Option<Vec<String>> {
    let up = level.checked_sub(1)?;
    if up > package.len() {
        return None;
    }
    Some(
        package[..package.len() - up]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
}

/// Package a file belongs to, as path segments.
///
/// Both `pkg/sub/mod.py` and `pkg/sub/__init__.py` live in package `pkg.sub`.
pub fn package_parts(rel_path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = rel_path.split('/').collect();
    parts.pop();
    parts
}

/// Name from a `dotted_name` or `aliased_import` node
fn imported_name(node: Node, src: &[u8]) -> Option<String> {
    match node.kind() {
        "aliased_import" => dotted_text(node.child_by_field_name("name")?, src),
        "dotted_name" => dotted_text(node, src),
        _ => None,
    }
}

/// Join the identifiers of a `dotted_name` with `.`, ignoring stray whitespace
fn dotted_text(node: Node, src: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let parts: Vec<&str> = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "identifier")
        .filter_map(|c| c.utf8_text(src).ok())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}
