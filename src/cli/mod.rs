//! CLI implementation for test-delta

mod commands;
mod config;
pub(crate) mod logging;

pub(crate) use config::find_project_root;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use test_delta::DeltaConfig;

use commands::{cmd_graph, cmd_run, cmd_save, cmd_select, cmd_status};
use logging::Logging;

#[derive(Parser)]
#[command(name = "test-delta")]
#[command(about = "Run only the Python tests affected by changes since the last green run")]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root (default: nearest directory with pyproject.toml, setup.py, setup.cfg or .git)
    #[arg(long, global = true, env = "TEST_DELTA_ROOT")]
    root: Option<PathBuf>,

    /// Snapshot file (relative paths are taken from the root)
    #[arg(long, global = true, env = "TEST_DELTA_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Ignore the stored snapshot and treat this as a first run
    #[arg(long, global = true)]
    rebuild: bool,

    /// Never write the snapshot
    #[arg(long, global = true)]
    no_save: bool,

    /// Show debug info, including why impact analysis fell back to running everything
    #[arg(short = 'v', long, global = true, env = "TEST_DELTA_DEBUG")]
    pub(crate) debug: bool,

    /// Exclude paths matching this glob from discovery (repeatable)
    #[arg(long = "ignore", value_name = "GLOB", global = true)]
    ignore: Vec<String>,

    /// Also treat files changed since this git ref as modified
    #[arg(long, value_name = "REF", global = true)]
    git_base: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show changed files and the tests they select
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the selected test files, one per line
    Select {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a test command with the selected test files appended
    Run {
        /// Test command, e.g. `-- pytest -q`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
    /// Rebuild and write the baseline snapshot
    Save,
    /// Export the dependency graph
    Graph {
        /// Output format
        #[arg(long, value_enum, default_value_t = GraphFormat::Mermaid)]
        format: GraphFormat,
        /// Only draw these files and their neighbourhood
        files: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum GraphFormat {
    Mermaid,
    Json,
}

/// Run CLI with pre-parsed arguments
pub(crate) fn run_with(cli: Cli, logging: &Logging) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    if config.debug && !cli.debug {
        logging.enable_debug();
    }

    match cli.command {
        Commands::Status { json } => cmd_status(config, json),
        Commands::Select { json } => cmd_select(config, json),
        Commands::Run { ref command } => cmd_run(config, command),
        Commands::Save => cmd_save(config),
        Commands::Graph { format, ref files } => cmd_graph(config, format, files),
    }
}

/// Layer CLI flags over the config files. CLI flags always win.
fn load_config(cli: &Cli) -> Result<DeltaConfig> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            find_project_root(&cwd)
        }
    };

    let mut builder = DeltaConfig::load(&root)
        .with_context(|| format!("Failed to load config for {}", root.display()))?;
    if let Some(snapshot) = &cli.snapshot {
        builder = builder.snapshot_path(snapshot);
    }
    if cli.rebuild {
        builder = builder.rebuild(true);
    }
    if cli.no_save {
        builder = builder.no_save(true);
    }
    if cli.debug {
        builder = builder.debug(true);
    }
    for pattern in &cli.ignore {
        builder = builder.ignore(pattern);
    }
    if let Some(base) = &cli.git_base {
        builder = builder.git_base(base);
    }
    Ok(builder.build()?)
}

/// Clamp a host exit code into a process exit code.
pub(crate) fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
