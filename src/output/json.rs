//! JSON output formatter for machine processing
//!
//! Outcomes are serialized as-is; `--quiet` selects compact single-line output.

use crate::orchestrator::{CheckOutcome, InstallOutcome};
use crate::output::{OutputFormatter, Verbosity};
use crate::package_manager::EnvironmentReport;
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level selects pretty or compact output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn write_value<T: Serialize>(&self, value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = if self.verbosity == Verbosity::Quiet {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        }
        .map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_check(
        &self,
        outcome: &CheckOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write_value(outcome, writer)
    }

    fn format_install(
        &self,
        outcome: &InstallOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write_value(outcome, writer)
    }

    fn format_environment(
        &self,
        report: &EnvironmentReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write_value(report, writer)
    }
}
