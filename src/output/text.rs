//! Text output formatter for human-readable display
//!
//! This module provides:
//! - ✅/❌/⚠ verdict lines for check, install and doctor
//! - Conflict and skipped requirement listings
//! - pip check issues and unreadable inventory warnings

use crate::domain::{CompatibilityReport, InventoryStatus, SkippedRequirement};
use crate::orchestrator::{CheckOutcome, CheckStatus, InstallOutcome, InstallStatus};
use crate::output::{OutputFormatter, Verbosity};
use crate::package_manager::{EnvironmentReport, EnvironmentStatus};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    fn good(&self, message: &str) -> String {
        if self.color {
            message.green().bold().to_string()
        } else {
            message.to_string()
        }
    }

    fn bad(&self, message: &str) -> String {
        if self.color {
            message.red().bold().to_string()
        } else {
            message.to_string()
        }
    }

    fn warn(&self, message: &str) -> String {
        if self.color {
            message.yellow().to_string()
        } else {
            message.to_string()
        }
    }

    fn dim(&self, message: &str) -> String {
        if self.color {
            message.dimmed().to_string()
        } else {
            message.to_string()
        }
    }

    fn write_environment_issues(
        &self,
        environment: Option<&EnvironmentReport>,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let Some(environment) = environment else {
            return Ok(());
        };

        match &environment.status {
            EnvironmentStatus::Healthy => Ok(()),
            EnvironmentStatus::Broken { issues } => {
                writeln!(writer, "{}", self.warn("⚠ pip check found issues:"))?;
                for issue in issues {
                    writeln!(writer, "   {}", issue)?;
                }
                Ok(())
            }
            EnvironmentStatus::Unavailable { reason } => {
                if self.verbosity == Verbosity::Verbose {
                    writeln!(
                        writer,
                        "{}",
                        self.warn(&format!("⚠ pip check could not run: {}", reason))
                    )?;
                }
                Ok(())
            }
        }
    }

    fn write_inventory_status(
        &self,
        status: &InventoryStatus,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if let InventoryStatus::Unreadable { reason } = status {
            writeln!(
                writer,
                "{}",
                self.warn("⚠ Error: Failed to parse installed packages.")
            )?;
            writeln!(writer, "   {}", self.dim(reason))?;
        }
        Ok(())
    }

    fn write_report_details(
        &self,
        report: &CompatibilityReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if !report.conflicts.is_empty() {
            writeln!(
                writer,
                "{}",
                self.warn(&format!(
                    "⚠ Conflicts detected for {} {}:",
                    report.package, report.version
                ))
            )?;
            for conflict in &report.conflicts {
                writeln!(writer, "   - ❌ {}", conflict)?;
            }
        }

        if !report.unverifiable.is_empty() {
            writeln!(
                writer,
                "{}",
                self.warn(&format!(
                    "⚠ {} requirement(s) on installed packages could not be evaluated:",
                    report.unverifiable.len()
                ))
            )?;
            self.write_requirement_list(&report.unverifiable, Some("❌ "), writer)?;
        }

        if !report.skipped.is_empty() {
            writeln!(
                writer,
                "{}",
                self.warn(&format!(
                    "⚠ {} requirement(s) were skipped:",
                    report.skipped.len()
                ))
            )?;
            self.write_requirement_list(&report.skipped, None, writer)?;
        }

        Ok(())
    }

    fn write_requirement_list(
        &self,
        requirements: &[SkippedRequirement],
        mark: Option<&str>,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for requirement in requirements {
            writeln!(
                writer,
                "   - {}{} {}",
                mark.unwrap_or(""),
                requirement.requirement,
                self.dim(&format!("({})", requirement.reason))
            )?;
        }
        Ok(())
    }
}

impl OutputFormatter for TextFormatter {
    fn format_check(
        &self,
        outcome: &CheckOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if !self.quiet() {
            self.write_environment_issues(outcome.environment.as_ref(), writer)?;
            self.write_inventory_status(&outcome.inventory, writer)?;
            if let Some(ref report) = outcome.report {
                self.write_report_details(report, writer)?;
            }
        }

        match outcome.status {
            CheckStatus::Compatible => writeln!(writer, "{}", self.good("✅ Upgrade is safe.")),
            CheckStatus::Incompatible => {
                writeln!(writer, "{}", self.bad("❌ Upgrade will cause conflicts."))
            }
            CheckStatus::NotFound => writeln!(
                writer,
                "{}",
                self.bad(&format!(
                    "⚠ Error: Could not fetch metadata for {} {}.",
                    outcome.package, outcome.version
                ))
            ),
            CheckStatus::Failed => writeln!(
                writer,
                "{}",
                self.bad(&format!(
                    "⚠ Error: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                ))
            ),
        }
    }

    fn format_install(
        &self,
        outcome: &InstallOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if !self.quiet() {
            self.write_environment_issues(outcome.environment.as_ref(), writer)?;
            self.write_inventory_status(&outcome.inventory, writer)?;
        }

        let package = &outcome.package;

        let Some(ref selection) = outcome.selection else {
            if !self.quiet() {
                if let Some(ref error) = outcome.error {
                    writeln!(writer, "{}", self.warn(&format!("⚠ Error: {}", error)))?;
                }
            }
            return writeln!(
                writer,
                "{}",
                self.bad("❌ No compatible version found. Installation aborted.")
            );
        };

        let version = &selection.version;

        if !self.quiet() {
            writeln!(
                writer,
                "{}",
                self.good(&format!("✅ Found compatible version: {}", version))
            )?;
            if self.verbosity == Verbosity::Verbose {
                writeln!(
                    writer,
                    "   {}",
                    self.dim(&format!("checked {} candidate(s)", selection.examined))
                )?;
            }
        }

        if outcome.status == InstallStatus::WouldInstall {
            return writeln!(
                writer,
                "{}",
                self.good(&format!("✅ Would install {} {} (dry run)", package, version))
            );
        }

        if !self.quiet() {
            writeln!(
                writer,
                "{}",
                self.good(&format!("✅ Installing {} {}...", package, version))
            )?;
        }

        if let Some(ref install) = outcome.install {
            if self.verbosity == Verbosity::Verbose {
                for line in install.stdout.lines() {
                    writeln!(writer, "   {}", self.dim(line))?;
                }
            }
            if !install.success && !self.quiet() {
                for line in install.stderr.lines() {
                    writeln!(writer, "   {}", line)?;
                }
            }
        }

        if outcome.status == InstallStatus::Installed {
            writeln!(
                writer,
                "{}",
                self.good(&format!("✅ Successfully installed {} {}", package, version))
            )
        } else {
            writeln!(
                writer,
                "{}",
                self.bad(&format!("❌ Installation failed for {} {}", package, version))
            )
        }
    }

    fn format_environment(
        &self,
        report: &EnvironmentReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        match &report.status {
            EnvironmentStatus::Healthy => {
                writeln!(writer, "{}", self.good("✅ No broken requirements found."))
            }
            EnvironmentStatus::Broken { issues } => {
                if !self.quiet() {
                    writeln!(writer, "{}", self.warn("⚠ pip check found issues:"))?;
                    for issue in issues {
                        writeln!(writer, "   {}", issue)?;
                    }
                }
                writeln!(
                    writer,
                    "{}",
                    self.bad("❌ Environment has broken requirements.")
                )
            }
            EnvironmentStatus::Unavailable { reason } => writeln!(
                writer,
                "{}",
                self.bad(&format!("⚠ Error: {} could not run: {}", report.command, reason))
            ),
        }
    }
}
