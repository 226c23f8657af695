//! pipguard - Check Python package upgrades against the installed environment
//!
//! Subcommands:
//! - check: is a specific release compatible with what is installed?
//! - install: install the newest release that is
//! - doctor: report requirements that are already broken

use clap::Parser;
use pipguard::cli::{CliArgs, Command};
use pipguard::logging;
use pipguard::orchestrator::{Orchestrator, EXIT_FAILURE};
use pipguard::output::create_formatter;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    logging::init(args.verbosity(), args.json);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let settings = args.settings()?;
    let formatter = create_formatter(&settings.output);
    let orchestrator = Orchestrator::new(settings)?;

    let code = match args.command {
        Command::Check { package, version } => {
            let outcome = orchestrator.check(&package, &version).await;
            formatter.format_check(&outcome, &mut io::stdout().lock())?;
            outcome.exit_code()
        }
        Command::Install { package, dry_run } => {
            let Some(package) = package else {
                println!("Usage: pipguard install [-v] <package_name>");
                return Ok(ExitCode::from(EXIT_FAILURE));
            };
            let outcome = orchestrator.install(&package, dry_run).await;
            formatter.format_install(&outcome, &mut io::stdout().lock())?;
            outcome.exit_code()
        }
        Command::Doctor => {
            let report = orchestrator.doctor();
            formatter.format_environment(&report, &mut io::stdout().lock())?;
            report.exit_code()
        }
    };

    io::stdout().flush()?;
    Ok(ExitCode::from(code))
}
