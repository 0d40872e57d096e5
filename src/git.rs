//! Git-reported changes
//!
//! Content fingerprints catch every edit since the last green run. Git adds
//! the edits since a base ref, which matters on CI where the snapshot may
//! come from a different branch.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to run git (is it installed?): {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {command} failed: {stderr}")]
    Failed { command: String, stderr: String },
}

/// Files changed relative to `base`, as root-relative `/`-separated paths.
///
/// `base` defaults to the current branch's upstream, then `HEAD`. With
/// `include_unstaged`, staged and unstaged working-tree changes are added.
/// Paths outside `root` are dropped.
pub fn changed_paths(
    root: &Path,
    base: Option<&str>,
    include_unstaged: bool,
) -> Result<BTreeSet<String>, GitError> {
    let _span = tracing::info_span!("git_changed_paths", ?base, include_unstaged).entered();

    let base = match base {
        Some(b) => {
            if b.starts_with('-') {
                return Err(GitError::Failed {
                    command: "diff".into(),
                    stderr: format!("invalid base ref '{b}': must not start with '-'"),
                });
            }
            b.to_string()
        }
        None => detect_upstream(root).unwrap_or_else(|| "HEAD".to_string()),
    };

    // Paths from git are relative to the repository top level
    let prefix = run_git(root, &["rev-parse", "--show-prefix"])?;
    let prefix = prefix.trim();

    let mut changed = BTreeSet::new();
    let diff = run_git(root, &["diff", "--name-only", &base, "--"])?;
    changed.extend(diff.lines().filter_map(|line| under_prefix(prefix, line)));

    if include_unstaged {
        let status = run_git(root, &["status", "--porcelain"])?;
        changed.extend(
            status
                .lines()
                .filter_map(porcelain_path)
                .filter_map(|path| under_prefix(prefix, path)),
        );
    }

    tracing::debug!(base = %base, changed = changed.len(), "Git changes collected");
    Ok(changed)
}

fn detect_upstream(root: &Path) -> Option<String> {
    let upstream = run_git(
        root,
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"],
    )
    .ok()?;
    let upstream = upstream.trim();
    if upstream.is_empty() {
        None
    } else {
        Some(upstream.to_string())
    }
}

fn run_git(root: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git")
        .arg("--no-pager")
        .args(args)
        .current_dir(root)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::Failed {
            command: args.join(" "),
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Path part of one `git status --porcelain` line (`XY path` or `XY old -> new`).
fn porcelain_path(line: &str) -> Option<&str> {
    let path = line.get(3..)?.trim();
    let path = match path.rsplit_once(" -> ") {
        Some((_, new)) => new,
        None => path,
    };
    let path = path.trim_matches('"');
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Strip the root's repo-relative prefix; `None` for paths outside the root.
fn under_prefix(prefix: &str, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    let rel = path.strip_prefix(prefix)?;
    if rel.is_empty() {
        None
    } else {
        Some(rel.to_string())
    }
}
