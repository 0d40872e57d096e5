//! Test-runner host boundary
//!
//! The host collects tests, runs them and reports an exit status. These types
//! are the only things the session needs from it.

use std::path::PathBuf;

use serde::Serialize;

/// One collected test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestItem {
    /// Host node id, e.g. `tests/test_calc.py::test_add`
    pub node_id: String,
    /// Source file the test lives in (absolute, or relative to the root)
    pub path: PathBuf,
    /// Carries the run-unconditionally marker
    pub always_run: bool,
}

impl TestItem {
    pub fn new(node_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            node_id: node_id.into(),
            path: path.into(),
            always_run: false,
        }
    }

    /// Mark the item as always selected
    pub fn always_run(mut self) -> Self {
        self.always_run = true;
        self
    }
}

/// Host items split by the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub selected: Vec<TestItem>,
    pub deselected: Vec<TestItem>,
}

impl Selection {
    /// Everything selected, nothing deselected
    pub fn all(items: Vec<TestItem>) -> Self {
        Self {
            selected: items,
            deselected: Vec::new(),
        }
    }
}

/// Host exit status, following the pytest exit code convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// 0: all tests passed
    Ok,
    /// 1: some tests failed
    TestsFailed,
    /// 2: run interrupted
    Interrupted,
    /// 3: internal host error
    InternalError,
    /// 4: command line usage error
    UsageError,
    /// 5: no tests were collected
    NoTestsCollected,
    /// Anything else a subprocess may return
    Other(i32),
}

impl ExitStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::TestsFailed,
            2 => Self::Interrupted,
            3 => Self::InternalError,
            4 => Self::UsageError,
            5 => Self::NoTestsCollected,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::TestsFailed => 1,
            Self::Interrupted => 2,
            Self::InternalError => 3,
            Self::UsageError => 4,
            Self::NoTestsCollected => 5,
            Self::Other(code) => code,
        }
    }

    /// Only a fully green run may update the baseline
    pub fn is_success(self) -> bool {
        self == Self::Ok
    }
}
