//! Dependency graph export (mermaid and JSON)

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::DependencyGraph;

/// Render the forward graph as a mermaid `graph TD`.
///
/// With an empty `focus` every file and edge is drawn. Otherwise only the
/// focus files, their direct dependencies and everything that depends on
/// them; focus nodes are highlighted. Edges point from importer to imported.
pub fn to_mermaid(graph: &DependencyGraph, focus: &BTreeSet<String>) -> String {
    let nodes: BTreeSet<&str> = if focus.is_empty() {
        graph.files().collect()
    } else {
        let mut nodes = BTreeSet::new();
        for path in focus.iter().filter(|p| graph.contains(p)) {
            nodes.insert(path.as_str());
            nodes.extend(graph.dependencies(path));
            nodes.extend(graph.dependents(path));
        }
        nodes
    };

    let ids: BTreeMap<&str, String> = nodes
        .iter()
        .enumerate()
        .map(|(i, path)| (*path, node_letter(i)))
        .collect();

    let mut lines = vec!["graph TD".to_string()];
    for (path, id) in &ids {
        lines.push(format!("    {}[\"{}\"]", id, mermaid_escape(path)));
        if focus.contains(*path) {
            lines.push(format!("    style {} fill:#f96", id));
        }
    }
    for (path, id) in &ids {
        let mut deps = graph.dependencies(path);
        deps.sort_unstable();
        for dep in deps {
            if let Some(dep_id) = ids.get(dep) {
                lines.push(format!("    {} --> {}", id, dep_id));
            }
        }
    }
    lines.join("\n")
}

/// Serialize both graph directions with sorted lists
pub fn to_json(graph: &DependencyGraph) -> serde_json::Value {
    serde_json::json!({
        "forward": graph.forward_map(),
        "reverse": graph.reverse_map(),
    })
}

/// Spreadsheet-style node ids: A..Z, AA, AB, ...
fn node_letter(mut i: usize) -> String {
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (i % 26) as u8) as char);
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }
    result
}

fn mermaid_escape(s: &str) -> String {
    s.replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
