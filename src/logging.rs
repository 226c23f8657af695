//! Logging setup using tracing-subscriber
//!
//! `RUST_LOG` takes precedence. Without it the filter follows the CLI
//! verbosity: debug with `-v`, warnings by default, nothing with `-q`.
//! Logs go to stdout, or to stderr when stdout carries JSON.

use crate::output::Verbosity;
use std::io::IsTerminal;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity level
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "off",
        Verbosity::Normal => "pipguard=warn",
        Verbosity::Verbose => "pipguard=debug",
    }
}

/// Install the global subscriber; later calls are no-ops
pub fn init(verbosity: Verbosity, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let (writer, ansi) = if json {
        (BoxMakeWriter::new(std::io::stderr), std::io::stderr().is_terminal())
    } else {
        (BoxMakeWriter::new(std::io::stdout), std::io::stdout().is_terminal())
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .without_time()
        .with_target(false)
        .try_init();
}
