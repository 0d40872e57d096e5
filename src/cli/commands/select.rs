//! Select command: print the test files to run

use std::process::ExitCode;

use anyhow::Result;

use test_delta::{DeltaConfig, Session};

use super::{state_label, Plan};

pub(crate) fn cmd_select(config: DeltaConfig, json: bool) -> Result<ExitCode> {
    let _span = tracing::info_span!("cmd_select").entered();

    let session = Session::configure(config);
    let plan = Plan::for_session(&session);

    if json {
        let result = serde_json::json!({
            "state": state_label(session.state()),
            "run_all": plan.run_all,
            "tests": plan.tests,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for test in &plan.tests {
            println!("{}", test);
        }
    }
    Ok(ExitCode::SUCCESS)
}
