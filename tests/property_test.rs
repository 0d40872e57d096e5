//! Property tests for graph invariants and the snapshot codec

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use test_delta::impact::affected;
use test_delta::{DependencyGraph, FileHashes, GraphMap, Snapshot};

fn file(i: usize) -> String {
    format!("m{}.py", i)
}

/// Random forward maps over up to 12 files, self edges and cycles included
fn arb_forward() -> impl Strategy<Value = GraphMap> {
    (1usize..12).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::btree_set(0..n, 0..4), n).prop_map(|adj| {
            adj.into_iter()
                .enumerate()
                .map(|(i, deps)| (file(i), deps.into_iter().map(file).collect()))
                .collect()
        })
    })
}

/// Files reachable from `start` by following reverse edges, by plain DFS
fn naive_dependents(forward: &GraphMap, start: &str) -> BTreeSet<String> {
    let mut importers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (from, deps) in forward {
        for dep in deps {
            if dep != from {
                importers.entry(dep.as_str()).or_default().push(from.as_str());
            }
        }
    }
    let mut seen = BTreeSet::new();
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        for &importer in importers.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            if seen.insert(importer.to_string()) {
                stack.push(importer);
            }
        }
    }
    seen
}

proptest! {
    #[test]
    fn prop_forward_graph_has_no_self_loops(forward in arb_forward()) {
        let graph = DependencyGraph::from_forward(&forward);
        for (file, deps) in graph.forward_map() {
            prop_assert!(!deps.contains(&file), "{} imports itself", file);
        }
    }

    #[test]
    fn prop_reverse_entry_is_full_closure(forward in arb_forward()) {
        let graph = DependencyGraph::from_forward(&forward);
        let reverse = graph.reverse_map();
        for file in forward.keys() {
            prop_assert_eq!(&reverse[file], &naive_dependents(&forward, file));
        }
    }

    #[test]
    fn prop_affected_contains_changed_and_is_stable(
        forward in arb_forward(),
        picks in prop::collection::btree_set(0usize..12, 0..4),
    ) {
        let graph = DependencyGraph::from_forward(&forward);
        let changed: BTreeSet<String> = picks.into_iter().map(file).collect();
        let first = affected(&changed, &graph);
        let second = affected(&changed, &graph);
        prop_assert!(changed.is_subset(&first));
        prop_assert_eq!(&first, &second);
        if changed.is_empty() {
            prop_assert!(first.is_empty());
        }
    }

    #[test]
    fn prop_snapshot_round_trip(
        forward in arb_forward(),
        hashes in prop::collection::btree_map("[a-z]{1,8}/[a-z]{1,8}\\.py", "[0-9a-f]{16}", 0..10),
    ) {
        let hashes: FileHashes = hashes;
        let snapshot = Snapshot::new(hashes, &DependencyGraph::from_forward(&forward));
        let decoded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        prop_assert_eq!(decoded, snapshot);
    }

    #[test]
    fn prop_snapshot_decoder_never_panics(input in "\\PC{0,200}") {
        let _ = Snapshot::from_json(input.as_bytes());
    }
}
