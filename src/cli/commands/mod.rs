//! CLI command handlers
//!
//! Each submodule handles one CLI subcommand.

mod graph;
mod run;
mod save;
mod select;
mod status;

pub(crate) use graph::cmd_graph;
pub(crate) use run::cmd_run;
pub(crate) use save::cmd_save;
pub(crate) use select::cmd_select;
pub(crate) use status::cmd_status;

use std::collections::BTreeSet;

use test_delta::{session, FirstRunReason, Session, SessionState};

/// Test files a file-level host should run
pub(crate) struct Plan {
    /// Run the whole suite (no usable baseline)
    pub run_all: bool,
    /// Selected test files, always-run ones included
    pub tests: BTreeSet<String>,
}

impl Plan {
    pub(crate) fn for_session(session: &Session) -> Self {
        let config = session.config();
        match session.state() {
            SessionState::Disabled | SessionState::FirstRun(_) => Self {
                run_all: true,
                tests: session::test_files(config, &config.source_tree().discover()),
            },
            SessionState::NoChanges => {
                let all = session::test_files(config, &config.source_tree().discover());
                Self {
                    run_all: false,
                    tests: all.into_iter().filter(|t| config.is_always_run(t)).collect(),
                }
            }
            SessionState::Selected(analysis) => {
                let mut tests = analysis.selected_tests.clone();
                tests.extend(
                    analysis
                        .test_files
                        .iter()
                        .filter(|t| config.is_always_run(t))
                        .cloned(),
                );
                Self {
                    run_all: false,
                    tests,
                }
            }
        }
    }
}

/// Short label for the session state
pub(crate) fn state_label(state: &SessionState) -> &'static str {
    match state {
        SessionState::Disabled => "disabled",
        SessionState::FirstRun(FirstRunReason::NoSnapshot) => "first-run",
        SessionState::FirstRun(FirstRunReason::Rebuild) => "rebuild",
        SessionState::FirstRun(FirstRunReason::Degraded) => "degraded",
        SessionState::NoChanges => "no-changes",
        SessionState::Selected(_) => "selected",
    }
}
