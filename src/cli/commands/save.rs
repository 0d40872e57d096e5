//! Save command: write a fresh baseline

use std::process::ExitCode;

use anyhow::{Context, Result};

use test_delta::{session, DeltaConfig};

/// Rebuild from the working tree and persist, regardless of test results
pub(crate) fn cmd_save(config: DeltaConfig) -> Result<ExitCode> {
    let _span = tracing::info_span!("cmd_save").entered();

    let snapshot = session::build_baseline(&config);
    snapshot
        .save(&config.snapshot_path)
        .with_context(|| format!("Failed to write {}", config.snapshot_path.display()))?;
    println!(
        "Saved baseline: {} file{} -> {}",
        snapshot.file_hashes.len(),
        if snapshot.file_hashes.len() == 1 { "" } else { "s" },
        config.snapshot_path.display()
    );
    Ok(ExitCode::SUCCESS)
}
