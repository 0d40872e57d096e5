//! Common test fixtures and helpers
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::TestProject;
//! ```

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use test_delta::{DeltaConfig, ExitStatus, Session, TestItem};

/// Throwaway Python project with automatic cleanup
pub struct TestProject {
    /// Temp directory (kept alive to prevent cleanup)
    dir: TempDir,
}

impl TestProject {
    /// Empty project with a `pyproject.toml` marker
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"demo\"\n")
            .expect("Failed to write pyproject.toml");
        Self { dir }
    }

    /// `utils.py` <- `calculator.py` <- `test_calculator.py`, plus an unrelated test
    pub fn calculator() -> Self {
        let project = Self::new();
        project.write("utils.py", "def add(a, b):\n    return a + b\n");
        project.write(
            "calculator.py",
            "from utils import add\n\n\ndef calculate(a, b):\n    return add(a, b)\n",
        );
        project.write(
            "test_calculator.py",
            concat!(
                "from calculator import calculate\n\n\n",
                "def test_calculate():\n    assert calculate(1, 2) == 3\n",
            ),
        );
        project.write("test_standalone.py", "def test_truth():\n    assert True\n");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file, creating parent directories
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.path(rel)).expect("Failed to remove file");
    }

    /// Run git in the project root, panicking on failure
    pub fn git(&self, args: &[&str]) {
        let status = std::process::Command::new("git")
            .args(["-c", "user.name=Test", "-c", "user.email=test@test.com"])
            .args(args)
            .current_dir(self.root())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .unwrap_or_else(|e| panic!("Failed to run git {:?}: {}", args, e));
        assert!(status.success(), "git {:?} failed", args);
    }

    /// Stage everything and commit
    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "."]);
        self.git(&["commit", "-q", "-m", message]);
    }

    /// Config with built-in defaults only
    pub fn config(&self) -> DeltaConfig {
        DeltaConfig::builder(self.root())
            .build()
            .expect("Failed to build config")
    }

    /// First green run: writes the baseline
    pub fn baseline(&self) {
        let outcome = Session::configure(self.config()).finish(ExitStatus::Ok);
        assert!(outcome.saved, "baseline was not written");
    }

    /// One host item per test file, `<file>::test`
    pub fn items(&self, files: &[&str]) -> Vec<TestItem> {
        files
            .iter()
            .map(|f| TestItem::new(format!("{}::test", f), *f))
            .collect()
    }
}

/// Source paths of items, in order, `/`-separated
pub fn node_files(items: &[TestItem]) -> Vec<String> {
    items
        .iter()
        .map(|i| i.path.to_string_lossy().replace('\\', "/"))
        .collect()
}
