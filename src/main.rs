use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();
    // Log to stderr to keep stdout clean for the selection output
    let logging = cli::logging::init(cli.debug);
    cli::run_with(cli, &logging)
}
