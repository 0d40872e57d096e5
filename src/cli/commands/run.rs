//! Run command: a subprocess host for the selected tests

use std::process::{Command, ExitCode};

use anyhow::{Context, Result};

use test_delta::{DeltaConfig, ExitStatus, Session};

use super::Plan;
use crate::cli::exit_code;

/// Run `command` with the selected test files appended.
///
/// Nothing is spawned when no test needs to run. The child's exit code goes
/// through `Session::finish`, so the baseline is only written after a green run.
pub(crate) fn cmd_run(config: DeltaConfig, command: &[String]) -> Result<ExitCode> {
    let _span = tracing::info_span!("cmd_run").entered();

    let (program, args) = command.split_first().context("No test command given")?;
    let session = Session::configure(config);
    let plan = Plan::for_session(&session);

    if !plan.run_all && plan.tests.is_empty() {
        eprintln!("test-delta: no affected tests, nothing to run");
        let outcome = session.finish(ExitStatus::NoTestsCollected);
        return Ok(exit_code(outcome.exit_status.code()));
    }

    let mut child = Command::new(program);
    child.args(args).current_dir(&session.config().root);
    if !plan.run_all {
        child.args(&plan.tests);
    }
    tracing::debug!(
        program = %program,
        tests = plan.tests.len(),
        run_all = plan.run_all,
        "Spawning test command"
    );

    let status = child
        .status()
        .with_context(|| format!("Failed to run '{}'", program))?;
    // Killed by a signal
    let code = status.code().unwrap_or(ExitStatus::Interrupted.code());

    let outcome = session.finish(ExitStatus::from_code(code));
    if outcome.saved {
        eprintln!("test-delta: baseline updated");
    }
    Ok(exit_code(outcome.exit_status.code()))
}
