//! Session integration tests
//!
//! Full configure / filter / finish cycles over throwaway projects.

mod common;

use std::collections::BTreeSet;

use common::{node_files, TestProject};
use test_delta::{
    DeltaConfig, ExitStatus, FirstRunReason, Session, SessionState, Snapshot, SnapshotError,
};

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn selected_tests(project: &TestProject) -> BTreeSet<String> {
    let session = Session::configure(project.config());
    match session.state() {
        SessionState::Selected(analysis) => analysis.selected_tests.clone(),
        SessionState::NoChanges => BTreeSet::new(),
        other => panic!("expected a selecting session, got {:?}", other),
    }
}

#[test]
fn test_changing_utils_selects_calculator_chain() {
    let project = TestProject::calculator();
    project.baseline();

    project.write("utils.py", "def add(a, b):\n    return a + b + 0\n");
    let session = Session::configure(project.config());
    let analysis = session.analysis().expect("expected analysis");
    assert_eq!(
        analysis.affected,
        set(&["calculator.py", "test_calculator.py", "utils.py"])
    );
    assert_eq!(analysis.selected_tests, set(&["test_calculator.py"]));

    let selection = session.filter(project.items(&["test_calculator.py", "test_standalone.py"]));
    assert_eq!(node_files(&selection.selected), vec!["test_calculator.py"]);
    assert_eq!(node_files(&selection.deselected), vec!["test_standalone.py"]);
}

#[test]
fn test_unchanged_tree_runs_nothing_and_reports_success() {
    let project = TestProject::calculator();
    project.baseline();

    let session = Session::configure(project.config());
    assert!(matches!(session.state(), SessionState::NoChanges));
    let selection = session.filter(project.items(&["test_calculator.py", "test_standalone.py"]));
    assert!(selection.selected.is_empty());

    let outcome = session.finish(ExitStatus::NoTestsCollected);
    assert_eq!(outcome.exit_status, ExitStatus::Ok);
    assert!(!outcome.saved);
}

#[test]
fn test_analysis_is_idempotent() {
    let project = TestProject::calculator();
    project.baseline();
    project.write(
        "calculator.py",
        "from utils import add\n\ndef calculate(a, b):\n    return add(b, a)\n",
    );

    let first = Session::configure(project.config());
    let second = Session::configure(project.config());
    assert_eq!(
        first.analysis().unwrap().affected,
        second.analysis().unwrap().affected
    );
}

#[test]
fn test_new_test_file_always_selected() {
    let project = TestProject::calculator();
    project.baseline();

    project.write("test_fresh.py", "def test_fresh():\n    pass\n");
    assert_eq!(selected_tests(&project), set(&["test_fresh.py"]));
}

#[test]
fn test_root_conftest_selects_every_test() {
    let project = TestProject::calculator();
    project.write("tests/unit/test_a.py", "def test_a():\n    pass\n");
    project.write("conftest.py", "");
    project.baseline();

    project.write("conftest.py", "import pytest\n");
    assert_eq!(
        selected_tests(&project),
        set(&["test_calculator.py", "test_standalone.py", "tests/unit/test_a.py"])
    );
}

#[test]
fn test_nested_conftest_selects_its_subtree_only() {
    let project = TestProject::new();
    project.write("tests/unit/conftest.py", "");
    project.write("tests/unit/test_a.py", "def test_a():\n    pass\n");
    project.write("tests/unit/deep/test_b.py", "def test_b():\n    pass\n");
    project.write("tests/integration/test_c.py", "def test_c():\n    pass\n");
    project.write("tests/unit_extra/test_d.py", "def test_d():\n    pass\n");
    project.baseline();

    project.write(
        "tests/unit/conftest.py",
        "import pytest\n\n@pytest.fixture\ndef value():\n    return 1\n",
    );
    assert_eq!(
        selected_tests(&project),
        set(&["tests/unit/deep/test_b.py", "tests/unit/test_a.py"])
    );
}

#[test]
fn test_deleted_module_marks_former_dependents() {
    let project = TestProject::new();
    project.write("helpers.py", "def help():\n    return 1\n");
    project.write(
        "test_helpers.py",
        "from helpers import help\n\ndef test_help():\n    assert help()\n",
    );
    project.write("test_other.py", "def test_other():\n    pass\n");
    project.baseline();

    project.remove("helpers.py");
    let session = Session::configure(project.config());
    let analysis = session.analysis().expect("expected analysis");
    assert_eq!(analysis.changes.deleted, set(&["helpers.py"]));
    assert_eq!(analysis.selected_tests, set(&["test_helpers.py"]));
}

#[test]
fn test_package_init_change_reaches_submodule_importers() {
    let project = TestProject::new();
    project.write("pkg/__init__.py", "");
    project.write("pkg/sub/__init__.py", "");
    project.write("pkg/sub/core.py", "VALUE = 1\n");
    project.write(
        "tests/test_core.py",
        "from pkg.sub.core import VALUE\n\ndef test_value():\n    assert VALUE\n",
    );
    project.write("tests/test_other.py", "def test_other():\n    pass\n");
    project.baseline();

    project.write("pkg/__init__.py", "from .sub import core\n");
    assert_eq!(selected_tests(&project), set(&["tests/test_core.py"]));
}

#[test]
fn test_relative_imports_are_followed() {
    let project = TestProject::new();
    project.write("app/__init__.py", "");
    project.write("app/models.py", "class User:\n    pass\n");
    project.write("app/views.py", "from .models import User\n");
    project.write("app/tests/__init__.py", "");
    project.write(
        "app/tests/test_views.py",
        "from ..views import *\n\ndef test_views():\n    pass\n",
    );
    project.baseline();

    project.write("app/models.py", "class User:\n    name = 'x'\n");
    assert_eq!(selected_tests(&project), set(&["app/tests/test_views.py"]));
}

#[test]
fn test_src_layout_imports_resolve_without_prefix() {
    let project = TestProject::new();
    project.write("src/mylib/__init__.py", "");
    project.write("src/mylib/math.py", "def double(x):\n    return 2 * x\n");
    project.write(
        "tests/test_math.py",
        "from mylib.math import double\n\ndef test_double():\n    assert double(2) == 4\n",
    );
    project.baseline();

    project.write("src/mylib/math.py", "def double(x):\n    return x + x\n");
    assert_eq!(selected_tests(&project), set(&["tests/test_math.py"]));
}

#[test]
fn test_failed_run_keeps_previous_baseline() {
    let project = TestProject::calculator();
    project.baseline();
    let before = Snapshot::load(&project.config().snapshot_path).unwrap().unwrap();

    project.write("utils.py", "def add(a, b):\n    return a - b\n");
    let outcome = Session::configure(project.config()).finish(ExitStatus::TestsFailed);
    assert!(!outcome.saved);
    assert_eq!(outcome.exit_status, ExitStatus::TestsFailed);

    let after = Snapshot::load(&project.config().snapshot_path).unwrap().unwrap();
    assert_eq!(before, after);

    // Still selected next time, since the baseline never moved
    assert_eq!(selected_tests(&project), set(&["test_calculator.py"]));
}

#[test]
fn test_green_run_moves_baseline_forward() {
    let project = TestProject::calculator();
    project.baseline();

    project.write("utils.py", "def add(a, b):\n    return b + a\n");
    let outcome = Session::configure(project.config()).finish(ExitStatus::Ok);
    assert!(outcome.saved);

    let session = Session::configure(project.config());
    assert!(matches!(session.state(), SessionState::NoChanges));
}

#[test]
fn test_snapshot_from_newer_schema_degrades_to_full_run() {
    let project = TestProject::calculator();
    project.write(
        ".delta-snapshot.json",
        r#"{"version": 999, "file_hashes": {}, "graph": {"forward": {}, "reverse": {}}}"#,
    );
    assert!(matches!(
        Snapshot::load(&project.config().snapshot_path),
        Err(SnapshotError::VersionTooNew { found: 999, .. })
    ));

    let session = Session::configure(project.config());
    assert!(matches!(
        session.state(),
        SessionState::FirstRun(FirstRunReason::Degraded)
    ));
    let selection = session.filter(project.items(&["test_calculator.py", "test_standalone.py"]));
    assert_eq!(selection.selected.len(), 2);

    // A green full run replaces the unreadable snapshot
    assert!(session.finish(ExitStatus::Ok).saved);
    assert!(Snapshot::load(&project.config().snapshot_path).unwrap().is_some());
}

#[test]
fn test_rebuild_ignores_existing_snapshot() {
    let project = TestProject::calculator();
    project.baseline();

    let config = DeltaConfig::builder(project.root()).rebuild(true).build().unwrap();
    let session = Session::configure(config);
    assert!(matches!(
        session.state(),
        SessionState::FirstRun(FirstRunReason::Rebuild)
    ));
}

#[test]
fn test_ignored_paths_are_not_tracked() {
    let project = TestProject::calculator();
    project.write("scripts/tool.py", "import utils\n");
    let config = DeltaConfig::builder(project.root())
        .ignore("scripts/**")
        .build()
        .unwrap();
    assert!(Session::configure(config.clone()).finish(ExitStatus::Ok).saved);

    let snapshot = Snapshot::load(&config.snapshot_path).unwrap().unwrap();
    assert!(!snapshot.file_hashes.contains_key("scripts/tool.py"));
    assert!(snapshot.file_hashes.contains_key("utils.py"));
}

#[test]
fn test_always_run_glob_survives_no_changes() {
    let project = TestProject::calculator();
    project.baseline();

    let config = DeltaConfig::builder(project.root())
        .always_run("test_standalone.py")
        .build()
        .unwrap();
    let session = Session::configure(config);
    let selection = session.filter(project.items(&["test_calculator.py", "test_standalone.py"]));
    assert_eq!(node_files(&selection.selected), vec!["test_standalone.py"]);
}

#[test]
fn test_absolute_item_paths_are_matched() {
    let project = TestProject::calculator();
    project.baseline();
    project.write("utils.py", "def add(a, b):\n    return 0\n");

    let session = Session::configure(project.config());
    let items = vec![test_delta::TestItem::new(
        "test_calculator.py::test_calculate",
        project.path("test_calculator.py"),
    )];
    let selection = session.filter(items);
    assert_eq!(selection.selected.len(), 1);
    assert!(selection.deselected.is_empty());
}

#[test]
fn test_non_canonical_root_still_matches_absolute_items() {
    let project = TestProject::calculator();
    project.write("sub/keep.txt", "");
    project.baseline();
    project.write("utils.py", "def add(a, b):\n    return a + b + 0\n");

    // `<root>/sub/..` names the project but is not a prefix of item paths
    let detour = project.root().join("sub").join("..");
    let config = DeltaConfig::builder(&detour).build().unwrap();
    let session = Session::configure(config);

    let items = vec![
        test_delta::TestItem::new(
            "test_calculator.py::test_calculate",
            project.path("test_calculator.py"),
        ),
        test_delta::TestItem::new(
            "test_standalone.py::test_truth",
            project.path("test_standalone.py"),
        ),
    ];
    let selection = session.filter(items);
    assert_eq!(node_files(&selection.selected).len(), 1);
    assert!(node_files(&selection.selected)[0].ends_with("test_calculator.py"));
    assert_eq!(selection.deselected.len(), 1);
}

#[test]
fn test_git_base_changes_count_as_modified() {
    let project = TestProject::calculator();
    project.git(&["init", "-q"]);
    project.commit_all("init");
    project.write("utils.py", "def add(a, b):\n    return b + a\n");
    project.commit_all("edit utils");

    // Baseline already matches the working tree; only git sees the edit
    project.baseline();
    let config = DeltaConfig::builder(project.root())
        .git_base("HEAD~1")
        .build()
        .unwrap();
    let session = Session::configure(config);
    let analysis = session.analysis().expect("expected analysis");
    assert_eq!(analysis.changes.modified, set(&["utils.py"]));
    assert!(analysis.changes.added.is_empty());
    assert_eq!(analysis.selected_tests, set(&["test_calculator.py"]));
}

#[test]
fn test_git_base_failure_degrades_to_fingerprints() {
    let project = TestProject::calculator();
    project.baseline();

    // Not a git repository: no extra changes, no error
    let config = DeltaConfig::builder(project.root())
        .git_base("HEAD~1")
        .build()
        .unwrap();
    let session = Session::configure(config);
    assert!(matches!(session.state(), SessionState::NoChanges));
}
