//! Configuration for a test-delta session
//!
//! Values are layered in order (later overrides earlier):
//! 1. Built-in defaults
//! 2. `[tool.test-delta]` in `<root>/pyproject.toml`
//! 3. `<root>/.test-delta.toml`
//! 4. Builder setters (the CLI maps its flags onto these)
//!
//! The result is one [`DeltaConfig`] built once and passed down by reference.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use thiserror::Error;

use crate::discovery::SourceTree;
use crate::impact::DEFAULT_FIXTURE_FILE;
use crate::snapshot::DEFAULT_SNAPSHOT_FILE;

/// Project-level config file name
pub const CONFIG_FILE: &str = ".test-delta.toml";

/// Default test file name patterns
pub const DEFAULT_TEST_PATTERNS: &[&str] = &["test_*.py", "*_test.py"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid glob '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Options as they appear in a config file
///
/// # Example
///
/// ```toml
/// # .test-delta.toml, or [tool.test-delta] in pyproject.toml
/// enabled = true
/// snapshot = ".cache/delta.json"
/// ignore = ["scripts/**", "docs/**"]
/// test_patterns = ["test_*.py", "*_test.py", "check_*.py"]
/// fixture_file = "conftest.py"
/// always_run = ["tests/smoke/**"]
/// respect_gitignore = true
/// git_base = "origin/main"
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConfigFile {
    pub enabled: Option<bool>,
    #[serde(alias = "snapshot_path", alias = "snapshot-path")]
    pub snapshot: Option<PathBuf>,
    pub rebuild: Option<bool>,
    #[serde(alias = "no_save")]
    pub no_save: Option<bool>,
    pub debug: Option<bool>,
    pub ignore: Option<Vec<String>>,
    #[serde(alias = "test_patterns")]
    pub test_patterns: Option<Vec<String>>,
    #[serde(alias = "fixture_file")]
    pub fixture_file: Option<String>,
    #[serde(alias = "always_run")]
    pub always_run: Option<Vec<String>>,
    #[serde(alias = "respect_gitignore")]
    pub respect_gitignore: Option<bool>,
    #[serde(alias = "git_base")]
    pub git_base: Option<String>,
}

impl ConfigFile {
    /// Read a `.test-delta.toml`-style file. `Ok(None)` if it does not exist.
    pub fn from_path(path: &Path) -> Result<Option<Self>, ConfigError> {
        let Some(content) = read_optional(path)? else {
            return Ok(None);
        };
        let config = toml::from_str::<Self>(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), ?config, "Loaded config");
        Ok(Some(config))
    }

    /// Read the `[tool.test-delta]` table of a `pyproject.toml`.
    ///
    /// `Ok(None)` if the file or the table does not exist.
    pub fn from_pyproject(path: &Path) -> Result<Option<Self>, ConfigError> {
        let Some(content) = read_optional(path)? else {
            return Ok(None);
        };
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let table = content
            .parse::<toml::Table>()
            .map_err(|e| parse_err(e.to_string()))?;
        let Some(section) = table.get("tool").and_then(|t| t.get("test-delta")) else {
            return Ok(None);
        };
        let config = section
            .clone()
            .try_into::<Self>()
            .map_err(|e| parse_err(format!("[tool.test-delta]: {e}")))?;
        tracing::debug!(path = %path.display(), ?config, "Loaded pyproject config");
        Ok(Some(config))
    }

    /// Layer another config on top (other overrides self where present)
    fn override_with(self, other: Self) -> Self {
        ConfigFile {
            enabled: other.enabled.or(self.enabled),
            snapshot: other.snapshot.or(self.snapshot),
            rebuild: other.rebuild.or(self.rebuild),
            no_save: other.no_save.or(self.no_save),
            debug: other.debug.or(self.debug),
            ignore: other.ignore.or(self.ignore),
            test_patterns: other.test_patterns.or(self.test_patterns),
            fixture_file: other.fixture_file.or(self.fixture_file),
            always_run: other.always_run.or(self.always_run),
            respect_gitignore: other.respect_gitignore.or(self.respect_gitignore),
            git_base: other.git_base.or(self.git_base),
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(c) => Ok(Some(c)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Config layer from a fallible read; unusable files are skipped with a warning.
fn layer_or_skip(result: Result<Option<ConfigFile>, ConfigError>) -> ConfigFile {
    match result {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping config file");
            ConfigFile::default()
        }
    }
}

/// Effective session configuration
#[derive(Debug, Clone)]
pub struct DeltaConfig {
    /// Project root; every tracked path is relative to it
    pub root: PathBuf,
    pub enabled: bool,
    /// Absolute snapshot location
    pub snapshot_path: PathBuf,
    /// Ignore the stored snapshot and treat the run as a first run
    pub rebuild: bool,
    /// Compute the selection but never write the baseline
    pub no_save: bool,
    pub debug: bool,
    /// Globs over root-relative paths excluded from discovery
    pub ignore_globs: Vec<String>,
    /// Globs over file names that mark test files
    pub test_patterns: Vec<String>,
    /// File name of directory-scoped fixture files
    pub fixture_file: String,
    /// Globs over root-relative test paths that are always selected
    pub always_run: Vec<String>,
    pub respect_gitignore: bool,
    /// Git ref whose diff is merged into the changed set
    pub git_base: Option<String>,
    ignore_set: GlobSet,
    test_set: GlobSet,
    always_run_set: GlobSet,
}

impl DeltaConfig {
    /// Builder with built-in defaults only, no config files read.
    ///
    /// The root is canonicalized so absolute paths reported by a host can be
    /// matched against it; a root that cannot be resolved is kept as given.
    pub fn builder(root: &Path) -> ConfigBuilder {
        ConfigBuilder {
            root: dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf()),
            file: ConfigFile::default(),
        }
    }

    /// Builder seeded from the config files under `root`.
    ///
    /// Unreadable or unparsable files are skipped with a warning; only a root
    /// that cannot be resolved is an error.
    pub fn load(root: &Path) -> Result<ConfigBuilder, ConfigError> {
        let root = dunce::canonicalize(root).map_err(|source| ConfigError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let pyproject = layer_or_skip(ConfigFile::from_pyproject(&root.join("pyproject.toml")));
        let project = layer_or_skip(ConfigFile::from_path(&root.join(CONFIG_FILE)));
        let merged = pyproject.override_with(project);
        tracing::debug!(root = %root.display(), config = ?merged, "Effective config after merge");

        Ok(ConfigBuilder { root, file: merged })
    }

    /// Whether `rel_path` is excluded from discovery
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        self.ignore_set.is_match(rel_path)
    }

    /// Whether `rel_path` names a test file
    pub fn is_test_file(&self, rel_path: &str) -> bool {
        self.test_set.is_match(crate::file_name_key(rel_path))
    }

    /// Whether tests in `rel_path` run regardless of impact
    pub fn is_always_run(&self, rel_path: &str) -> bool {
        self.always_run_set.is_match(rel_path)
    }

    /// Discovery walker for this project
    pub fn source_tree(&self) -> SourceTree {
        SourceTree::new(self.root.clone())
            .with_ignore(self.ignore_set.clone())
            .with_gitignore(self.respect_gitignore)
    }
}

/// Builds a [`DeltaConfig`] on top of defaults and config files
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    root: PathBuf,
    file: ConfigFile,
}

impl ConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.file.enabled = Some(enabled);
        self
    }

    /// Snapshot location; relative paths are taken from the root
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file.snapshot = Some(path.into());
        self
    }

    pub fn rebuild(mut self, rebuild: bool) -> Self {
        self.file.rebuild = Some(rebuild);
        self
    }

    pub fn no_save(mut self, no_save: bool) -> Self {
        self.file.no_save = Some(no_save);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.file.debug = Some(debug);
        self
    }

    /// Add an ignore glob on top of the configured ones
    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.file
            .ignore
            .get_or_insert_with(Vec::new)
            .push(pattern.into());
        self
    }

    pub fn test_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file.test_patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn fixture_file(mut self, name: impl Into<String>) -> Self {
        self.file.fixture_file = Some(name.into());
        self
    }

    /// Add an always-run glob on top of the configured ones
    pub fn always_run(mut self, pattern: impl Into<String>) -> Self {
        self.file
            .always_run
            .get_or_insert_with(Vec::new)
            .push(pattern.into());
        self
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.file.respect_gitignore = Some(respect);
        self
    }

    pub fn git_base(mut self, base: impl Into<String>) -> Self {
        self.file.git_base = Some(base.into());
        self
    }

    /// Resolve defaults and compile globs.
    pub fn build(self) -> Result<DeltaConfig, ConfigError> {
        let file = self.file;
        let root = self.root;

        let snapshot_path = match file.snapshot {
            Some(p) if p.is_absolute() => p,
            Some(p) => root.join(p),
            None => root.join(DEFAULT_SNAPSHOT_FILE),
        };
        let ignore_globs = file.ignore.unwrap_or_default();
        let test_patterns = file
            .test_patterns
            .unwrap_or_else(|| DEFAULT_TEST_PATTERNS.iter().map(|s| s.to_string()).collect());
        let always_run = file.always_run.unwrap_or_default();

        let ignore_set = compile_path_globs(&ignore_globs)?;
        let test_set = compile_name_globs(&test_patterns)?;
        let always_run_set = compile_path_globs(&always_run)?;

        Ok(DeltaConfig {
            root,
            enabled: file.enabled.unwrap_or(true),
            snapshot_path,
            rebuild: file.rebuild.unwrap_or(false),
            no_save: file.no_save.unwrap_or(false),
            debug: file.debug.unwrap_or(false),
            ignore_globs,
            test_patterns,
            fixture_file: file
                .fixture_file
                .unwrap_or_else(|| DEFAULT_FIXTURE_FILE.to_string()),
            always_run,
            respect_gitignore: file.respect_gitignore.unwrap_or(false),
            git_base: file.git_base,
            ignore_set,
            test_set,
            always_run_set,
        })
    }
}

/// Globs over `/`-separated relative paths: `*` stays within one segment.
fn compile_path_globs(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    compile(patterns, |p| GlobBuilder::new(p).literal_separator(true).build())
}

/// Globs over bare file names
fn compile_name_globs(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    compile(patterns, Glob::new)
}

fn compile<F>(patterns: &[String], make: F) -> Result<GlobSet, ConfigError>
where
    F: Fn(&str) -> Result<Glob, globset::Error>,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = make(pattern).map_err(|source| ConfigError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}
