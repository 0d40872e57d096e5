//! Status command: what changed and which tests it selects

use std::collections::BTreeSet;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;

use test_delta::{DeltaConfig, Session, SessionState};

use super::{state_label, Plan};

/// Report changes since the baseline. Never writes the snapshot.
pub(crate) fn cmd_status(config: DeltaConfig, json: bool) -> Result<ExitCode> {
    let _span = tracing::info_span!("cmd_status").entered();

    let session = Session::configure(config);
    let plan = Plan::for_session(&session);
    let empty = BTreeSet::new();
    let (modified, added, deleted, affected) = match session.analysis() {
        Some(a) => (
            &a.changes.modified,
            &a.changes.added,
            &a.changes.deleted,
            &a.affected,
        ),
        None => (&empty, &empty, &empty, &empty),
    };

    if json {
        let result = serde_json::json!({
            "state": state_label(session.state()),
            "snapshot": session.config().snapshot_path,
            "modified": modified,
            "added": added,
            "deleted": deleted,
            "affected": affected,
            "run_all": plan.run_all,
            "selected": plan.tests,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(ExitCode::SUCCESS);
    }

    match session.state() {
        SessionState::Disabled => println!("test-delta is disabled"),
        SessionState::FirstRun(_) => println!(
            "{} ({}): all {} test file{} will run",
            "No baseline".yellow(),
            state_label(session.state()),
            plan.tests.len(),
            if plan.tests.len() == 1 { "" } else { "s" }
        ),
        SessionState::NoChanges => println!("{}", "No changes since baseline".green()),
        SessionState::Selected(_) => {
            print_group("Modified", modified);
            print_group("Added", added);
            print_group("Deleted", deleted);
            println!(
                "{} affected file{}, {} test file{} selected",
                affected.len(),
                if affected.len() == 1 { "" } else { "s" },
                plan.tests.len(),
                if plan.tests.len() == 1 { "" } else { "s" }
            );
            for test in &plan.tests {
                println!("  {}", test.cyan());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_group(label: &str, files: &BTreeSet<String>) {
    if files.is_empty() {
        return;
    }
    println!("{} ({}):", label.bold(), files.len());
    for file in files {
        println!("  {}", file);
    }
}
