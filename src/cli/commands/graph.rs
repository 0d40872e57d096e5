//! Graph command: export the import graph

use std::collections::BTreeSet;
use std::process::ExitCode;

use anyhow::Result;

use test_delta::{export, DeltaConfig, DependencyGraph, ModuleMap};

use crate::cli::GraphFormat;

pub(crate) fn cmd_graph(
    config: DeltaConfig,
    format: GraphFormat,
    files: &[String],
) -> Result<ExitCode> {
    let _span = tracing::info_span!("cmd_graph", ?format).entered();

    let sources = config.source_tree().discover();
    let module_map = ModuleMap::build(&sources);
    let graph = DependencyGraph::build(&config.root, &sources, &module_map);

    let focus: BTreeSet<String> = files
        .iter()
        .map(|f| f.trim_start_matches("./").replace('\\', "/"))
        .collect();
    for file in &focus {
        if !graph.contains(file) {
            tracing::warn!(file = %file, "Not a tracked source file");
        }
    }

    match format {
        GraphFormat::Mermaid => println!("{}", export::to_mermaid(&graph, &focus)),
        GraphFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&export::to_json(&graph))?)
        }
    }
    Ok(ExitCode::SUCCESS)
}
