//! mxci-test - Build platform containers and run tests inside them.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - other: exit code of the failed container command or build

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mxci_core::CiError;

mod commands;

use commands::{Action, Cli};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,mxci_cli={0},mxci_core={0},mxci_runner={0}",
            level
        ))
    });

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

async fn run(cli: &Cli) -> Result<()> {
    // Dockerfile paths and the build context are relative to this directory.
    std::env::set_current_dir(&cli.directory)
        .with_context(|| format!("Cannot change into {}", cli.directory.display()))?;

    match cli.action() {
        Action::List => commands::list::execute(),
        Action::Platform(platform) => commands::platform::execute(cli, &platform).await,
        Action::All => commands::all::execute(cli).await,
        Action::Help => commands::help::execute(),
    }
}

/// Propagate the exit code of a failed external process.
fn categorize_error(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<CiError>()
        .and_then(CiError::exit_code)
        .map(|code| code.clamp(1, 255) as u8)
        .unwrap_or(ExitCodes::GENERAL_ERROR)
}
