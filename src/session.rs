//! Session orchestration
//!
//! One [`Session`] per test run: `configure` before collection, `filter` over
//! the collected items, `finish` with the host's exit status. Each phase runs
//! an inner step returning `Result<_, DeltaError>`; on error the session falls
//! back to running everything and logs the phase at debug level. A failure in
//! impact analysis never breaks the test run itself.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path};

use thiserror::Error;

use crate::config::{ConfigError, DeltaConfig};
use crate::git::{self, GitError};
use crate::graph::DependencyGraph;
use crate::hasher::{self, FileHashes};
use crate::host::{ExitStatus, Selection, TestItem};
use crate::impact::{self, ChangeSet, ImpactResolver};
use crate::resolve::ModuleMap;
use crate::snapshot::{Snapshot, SnapshotError};

#[derive(Error, Debug)]
pub enum DeltaError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Lifecycle phase, for degradation diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configure,
    Filter,
    Finish,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Configure => "configure",
            Phase::Filter => "filter",
            Phase::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// Why a session runs every test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstRunReason {
    /// No snapshot on disk yet
    NoSnapshot,
    /// Rebuild was requested
    Rebuild,
    /// Configure failed (corrupt or too-new snapshot, ...)
    Degraded,
}

/// Configure-time impact analysis
#[derive(Debug, Clone)]
pub struct Analysis {
    pub changes: ChangeSet,
    /// Fingerprints of the working tree, persisted on success
    pub current_hashes: FileHashes,
    /// Graph over the working tree, persisted on success
    pub graph: DependencyGraph,
    /// Impact closure of the changes, fixture scope included
    pub affected: BTreeSet<String>,
    pub test_files: BTreeSet<String>,
    /// Test files to run
    pub selected_tests: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub enum SessionState {
    /// Turned off in config; the session does nothing
    Disabled,
    /// No usable baseline; every test runs
    FirstRun(FirstRunReason),
    /// Nothing changed since the baseline
    NoChanges,
    /// Some files changed; only the selected tests run
    Selected(Box<Analysis>),
}

/// What `finish` decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishOutcome {
    /// Status to report, possibly overridden from "no tests collected"
    pub exit_status: ExitStatus,
    /// Whether a new baseline was written
    pub saved: bool,
}

/// Session-scoped context owned by the host integration
#[derive(Debug)]
pub struct Session {
    config: DeltaConfig,
    state: SessionState,
}

impl Session {
    /// Analyse the working tree against the stored baseline. Never fails.
    pub fn configure(config: DeltaConfig) -> Self {
        let _span = tracing::info_span!("configure", root = %config.root.display()).entered();

        if !config.enabled {
            tracing::debug!("Disabled by config");
            return Self {
                config,
                state: SessionState::Disabled,
            };
        }

        let state = match analyze(&config) {
            Ok(state) => state,
            Err(e) => {
                degrade(Phase::Configure, &e);
                SessionState::FirstRun(FirstRunReason::Degraded)
            }
        };
        log_state(&state);
        Self { config, state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &DeltaConfig {
        &self.config
    }

    /// The analysis, when the session is selecting
    pub fn analysis(&self) -> Option<&Analysis> {
        match &self.state {
            SessionState::Selected(analysis) => Some(analysis.as_ref()),
            _ => None,
        }
    }

    /// Whether nothing needs to run apart from always-run items
    pub fn nothing_to_run(&self) -> bool {
        match &self.state {
            SessionState::NoChanges => true,
            SessionState::Selected(analysis) => analysis.selected_tests.is_empty(),
            SessionState::Disabled | SessionState::FirstRun(_) => false,
        }
    }

    /// Split host items into selected and deselected.
    ///
    /// Always-run items, and items whose file cannot be placed under the
    /// root, are always selected.
    pub fn filter(&self, items: Vec<TestItem>) -> Selection {
        let _span = tracing::info_span!("filter", items = items.len()).entered();

        let selected_tests = match &self.state {
            SessionState::Disabled | SessionState::FirstRun(_) => {
                return Selection::all(items);
            }
            SessionState::NoChanges => None,
            SessionState::Selected(analysis) => Some(&analysis.selected_tests),
        };

        let mut selection = Selection::default();
        for item in items {
            let keep = match self.item_key(&item.path) {
                None => true,
                Some(key) => {
                    item.always_run
                        || self.config.is_always_run(&key)
                        || selected_tests.is_some_and(|s| s.contains(&key))
                }
            };
            if keep {
                selection.selected.push(item);
            } else {
                selection.deselected.push(item);
            }
        }

        tracing::debug!(
            phase = %Phase::Filter,
            selected = selection.selected.len(),
            deselected = selection.deselected.len(),
            "Filtered test items"
        );
        selection
    }

    /// Root-relative key for a host item path
    fn item_key(&self, path: &Path) -> Option<String> {
        if path.is_absolute() {
            if let Some(key) = crate::relative_key(path, &self.config.root) {
                return Some(key);
            }
            let canonical = dunce::canonicalize(path).ok()?;
            return crate::relative_key(&canonical, &self.config.root);
        }

        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    /// Report the run's outcome and persist the baseline if it was green.
    ///
    /// "No tests collected" becomes success when nothing needed to run. The
    /// baseline is only written after a successful run and never with
    /// `no_save`. Save failures are logged and swallowed.
    pub fn finish(self, status: ExitStatus) -> FinishOutcome {
        let _span = tracing::info_span!("finish", status = status.code()).entered();

        let exit_status = if status == ExitStatus::NoTestsCollected && self.nothing_to_run() {
            tracing::debug!("No tests needed, reporting success");
            ExitStatus::Ok
        } else {
            status
        };

        let saved = match self.persist(exit_status) {
            Ok(saved) => saved,
            Err(e) => {
                degrade(Phase::Finish, &e);
                false
            }
        };
        FinishOutcome { exit_status, saved }
    }

    fn persist(self, status: ExitStatus) -> Result<bool, DeltaError> {
        if self.config.no_save {
            tracing::debug!("Snapshot persistence disabled");
            return Ok(false);
        }
        if !status.is_success() {
            tracing::debug!(status = status.code(), "Run not successful, keeping old baseline");
            return Ok(false);
        }

        let snapshot = match self.state {
            SessionState::Disabled => return Ok(false),
            SessionState::NoChanges => {
                tracing::debug!("Baseline unchanged");
                return Ok(false);
            }
            SessionState::FirstRun(_) => build_baseline(&self.config),
            SessionState::Selected(analysis) => {
                let analysis = *analysis;
                Snapshot::new(analysis.current_hashes, &analysis.graph)
            }
        };
        snapshot.save(&self.config.snapshot_path)?;
        tracing::info!(
            path = %self.config.snapshot_path.display(),
            files = snapshot.file_hashes.len(),
            "Baseline saved"
        );
        Ok(true)
    }
}

/// Fresh baseline for the working tree: discovery, hashing and graph build.
pub fn build_baseline(config: &DeltaConfig) -> Snapshot {
    let _span = tracing::info_span!("build_baseline").entered();
    let files = config.source_tree().discover();
    let hashes = hasher::hash_all(&config.root, &files);
    let graph = build_graph(config, &files);
    Snapshot::new(hashes, &graph)
}

/// Test files among the tracked sources
pub fn test_files(config: &DeltaConfig, files: &BTreeSet<String>) -> BTreeSet<String> {
    files
        .iter()
        .filter(|f| config.is_test_file(f))
        .cloned()
        .collect()
}

fn build_graph(config: &DeltaConfig, files: &BTreeSet<String>) -> DependencyGraph {
    let module_map = ModuleMap::build(files);
    DependencyGraph::build(&config.root, files, &module_map)
}

fn analyze(config: &DeltaConfig) -> Result<SessionState, DeltaError> {
    if config.rebuild {
        return Ok(SessionState::FirstRun(FirstRunReason::Rebuild));
    }
    let Some(baseline) = Snapshot::load(&config.snapshot_path)? else {
        return Ok(SessionState::FirstRun(FirstRunReason::NoSnapshot));
    };

    let files = config.source_tree().discover();
    let current_hashes = hasher::hash_all(&config.root, &files);
    let mut changes = ChangeSet::between(&baseline.file_hashes, &current_hashes);

    if let Some(base) = &config.git_base {
        match git::changed_paths(&config.root, Some(base), true) {
            Ok(paths) => {
                changes.mark_modified(paths.into_iter().filter(|p| current_hashes.contains_key(p)))
            }
            Err(e) => degrade(Phase::Configure, &DeltaError::from(e)),
        }
    }

    tracing::debug!(
        modified = changes.modified.len(),
        added = changes.added.len(),
        deleted = changes.deleted.len(),
        "Changes since baseline"
    );
    if changes.is_empty() {
        return Ok(SessionState::NoChanges);
    }

    let graph = build_graph(config, &files);
    let test_files = test_files(config, &files);
    let resolver = ImpactResolver::new(&test_files, &config.fixture_file);

    let mut affected = resolver.affected(&changes.all(), &graph);
    // The current graph has lost a deleted file's edges; the baseline has not
    affected.extend(impact::affected(&changes.deleted, &baseline.graph.reverse));

    let selected_tests = resolver.select(&affected, &baseline.file_hashes);

    Ok(SessionState::Selected(Box::new(Analysis {
        changes,
        current_hashes,
        graph,
        affected,
        test_files,
        selected_tests,
    })))
}

fn degrade(phase: Phase, error: &DeltaError) {
    tracing::debug!(%phase, %error, "Impact analysis failed, running every test");
}

fn log_state(state: &SessionState) {
    match state {
        SessionState::Disabled => {}
        SessionState::FirstRun(reason) => {
            tracing::debug!(?reason, "First run, every test selected")
        }
        SessionState::NoChanges => tracing::debug!("No changes since baseline"),
        SessionState::Selected(analysis) => tracing::debug!(
            affected = analysis.affected.len(),
            tests = analysis.test_files.len(),
            selected = analysis.selected_tests.len(),
            "Impact analysis done"
        ),
    }
}
