//! Package manager integration
//!
//! This module provides:
//! - The installed-package inventory (`pip list --format json`)
//! - Environment health check (`pip check`)
//! - Installation of a pinned release (`pip install name==version`)
//! - The target interpreter's Python version (`pip --version`)

use crate::domain::{InstalledPackage, Inventory};
use pep508_rs::pep440_rs::Version;
use regex::Regex;
use serde::Serialize;
use std::process::{Command, Output};
use std::sync::LazyLock;
use tracing::{debug, warn};

static PIP_PYTHON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(python (\d+(?:\.\d+)+)\)").unwrap());

/// Default package manager executable
pub const DEFAULT_PIP: &str = "pip";

/// Result of a package installation
#[derive(Debug, Clone, Serialize)]
pub struct InstallResult {
    /// Package that was installed
    pub package: String,
    /// Version that was requested
    pub version: String,
    /// The command that was executed
    pub command: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Standard output from the command
    #[serde(skip)]
    pub stdout: String,
    /// Standard error from the command
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl InstallResult {
    /// Create a successful install result
    pub fn success(
        package: impl Into<String>,
        version: impl Into<String>,
        command: String,
        stdout: String,
        stderr: String,
    ) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            command,
            success: true,
            stdout,
            stderr,
        }
    }

    /// Create a failed install result
    pub fn failure(
        package: impl Into<String>,
        version: impl Into<String>,
        command: String,
        stdout: String,
        stderr: String,
    ) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            command,
            success: false,
            stdout,
            stderr,
        }
    }
}

/// Health of the current environment as reported by `pip check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EnvironmentStatus {
    /// No broken requirements
    Healthy,
    /// Installed packages already have unmet requirements
    Broken { issues: Vec<String> },
    /// The check could not be run
    Unavailable { reason: String },
}

/// Result of an environment health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentReport {
    /// The command that was executed
    pub command: String,
    /// What the check found
    pub status: EnvironmentStatus,
}

impl EnvironmentReport {
    /// Returns true if the environment has no broken requirements
    pub fn is_healthy(&self) -> bool {
        self.status == EnvironmentStatus::Healthy
    }

    /// Process exit code for `doctor`: 1 when broken, 2 when the check could not run
    pub fn exit_code(&self) -> u8 {
        match self.status {
            EnvironmentStatus::Healthy => 0,
            EnvironmentStatus::Broken { .. } => 1,
            EnvironmentStatus::Unavailable { .. } => 2,
        }
    }

    /// Issues reported by the check, if any
    pub fn issues(&self) -> &[String] {
        match self.status {
            EnvironmentStatus::Broken { ref issues } => issues,
            _ => &[],
        }
    }
}

/// Trait for the local package manager
pub trait PackageManager: Send + Sync {
    /// Snapshot the installed packages; never fails, see [`Inventory::unreadable`]
    fn list_installed(&self) -> Inventory;

    /// Check the environment for already-broken requirements
    fn check_environment(&self) -> EnvironmentReport;

    /// Python version of the interpreter pip installs into, if known
    fn python_version(&self) -> Option<Version>;

    /// Install an exact release
    fn install(&self, package: &str, version: &str) -> InstallResult;
}

/// Package manager that executes real `pip` commands
#[derive(Debug, Clone)]
pub struct SystemPackageManager {
    /// Path or name of the pip executable
    program: String,
}

impl SystemPackageManager {
    /// Create a package manager using `pip` from PATH
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PIP)
    }

    /// Create a package manager using a specific pip executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn list_command(&self) -> Vec<String> {
        vec![
            self.program.clone(),
            "list".to_string(),
            "--format".to_string(),
            "json".to_string(),
        ]
    }

    fn version_command(&self) -> Vec<String> {
        vec![self.program.clone(), "--version".to_string()]
    }

    fn check_command(&self) -> Vec<String> {
        vec![self.program.clone(), "check".to_string()]
    }

    fn install_command(&self, package: &str, version: &str) -> Vec<String> {
        vec![
            self.program.clone(),
            "install".to_string(),
            format!("{}=={}", package, version),
        ]
    }

    /// Run a command and capture output
    fn run_command(&self, command: &[String]) -> std::io::Result<Output> {
        let Some((program, args)) = command.split_first() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Empty command",
            ));
        };

        debug!("Running {}", command.join(" "));
        Command::new(program).args(args).output()
    }
}

impl Default for SystemPackageManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the output of `pip list --format json`
pub fn parse_listing(stdout: &str) -> Result<Vec<InstalledPackage>, serde_json::Error> {
    serde_json::from_str(stdout.trim())
}

/// Extract the interpreter version from `pip --version` output,
/// e.g. `pip 24.0 from /usr/lib/python3/dist-packages/pip (python 3.12)`
pub fn parse_pip_python_version(stdout: &str) -> Option<Version> {
    let caps = PIP_PYTHON_RE.captures(stdout)?;
    caps.get(1)?.as_str().parse().ok()
}

impl PackageManager for SystemPackageManager {
    fn list_installed(&self) -> Inventory {
        let command = self.list_command();

        let output = match self.run_command(&command) {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run {}: {}", command.join(" "), e);
                return Inventory::unreadable(format!("failed to execute command: {}", e));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_listing(&stdout) {
            Ok(packages) => {
                debug!("Found {} installed packages", packages.len());
                Inventory::new(packages)
            }
            Err(e) => {
                warn!("Failed to parse installed packages: {}", e);
                Inventory::unreadable(format!(
                    "could not parse output of '{}' ({}): {}",
                    command.join(" "),
                    output.status,
                    e
                ))
            }
        }
    }

    fn python_version(&self) -> Option<Version> {
        let command = self.version_command();
        match self.run_command(&command) {
            Ok(output) if output.status.success() => {
                let python = parse_pip_python_version(&String::from_utf8_lossy(&output.stdout));
                if python.is_none() {
                    debug!("No Python version in output of {}", command.join(" "));
                }
                python
            }
            Ok(output) => {
                debug!("{} exited with {}", command.join(" "), output.status);
                None
            }
            Err(e) => {
                debug!("Failed to run {}: {}", command.join(" "), e);
                None
            }
        }
    }

    fn check_environment(&self) -> EnvironmentReport {
        let command = self.check_command();
        let command_str = command.join(" ");

        let status = match self.run_command(&command) {
            Ok(output) if output.status.success() => EnvironmentStatus::Healthy,
            Ok(output) => {
                let issues: Vec<String> = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect();

                if issues.is_empty() {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    EnvironmentStatus::Unavailable {
                        reason: format!("{} exited with {}: {}", command_str, output.status, stderr),
                    }
                } else {
                    EnvironmentStatus::Broken { issues }
                }
            }
            Err(e) => EnvironmentStatus::Unavailable {
                reason: format!("failed to execute command: {}", e),
            },
        };

        EnvironmentReport {
            command: command_str,
            status,
        }
    }

    fn install(&self, package: &str, version: &str) -> InstallResult {
        let command = self.install_command(package, version);
        let command_str = command.join(" ");

        match self.run_command(&command) {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                if output.status.success() {
                    InstallResult::success(package, version, command_str, stdout, stderr)
                } else {
                    InstallResult::failure(package, version, command_str, stdout, stderr)
                }
            }
            Err(e) => InstallResult::failure(
                package,
                version,
                command_str,
                String::new(),
                format!("Failed to execute command: {}", e),
            ),
        }
    }
}
