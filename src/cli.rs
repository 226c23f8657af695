//! CLI argument parsing module for pipguard

use crate::error::ConfigError;
use crate::output::{OutputConfig, Verbosity};
use crate::package_manager::DEFAULT_PIP;
use crate::registry::DEFAULT_INDEX_URL;
use clap::{Parser, Subcommand};
use std::time::Duration;

/// Parse timeout string in format: N (seconds), Ns (seconds), Nm (minutes)
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty timeout string".to_string());
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else {
        (s, 1)
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in timeout: {}", num_str))?;

    if num == 0 {
        return Err("timeout must be greater than zero".to_string());
    }

    let secs = num
        .checked_mul(multiplier)
        .ok_or_else(|| format!("timeout too large: {}", s))?;

    Ok(Duration::from_secs(secs))
}

/// Check that installing a Python package will not break the environment
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pipguard",
    version,
    about = "Check that installing a Python package will not break the current environment"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Print each step of the check
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// pip executable to query and install with
    #[arg(long, global = true, default_value = DEFAULT_PIP)]
    pub pip: String,

    /// Base URL of the package index
    #[arg(long, global = true, default_value = DEFAULT_INDEX_URL)]
    pub index_url: String,

    /// Timeout for each index request (e.g., 30, 30s, 2m)
    #[arg(long, global = true, default_value = "30s", value_parser = parse_timeout)]
    pub timeout: Duration,

    /// Retries after a failed index request
    #[arg(long, global = true, default_value_t = 1)]
    pub retries: u32,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check whether a specific release is compatible with installed packages
    Check {
        /// Package name
        package: String,
        /// Candidate version
        version: String,
    },

    /// Install the newest release that is compatible with installed packages
    Install {
        /// Package name
        package: Option<String>,

        /// Select the version but do not install it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Report already-broken requirements in the current environment
    Doctor,
}

/// Validated runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// pip executable
    pub pip: String,
    /// Index base URL without trailing slash
    pub index_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after a failed request
    pub retries: u32,
    /// Output configuration
    pub output: OutputConfig,
}

impl CliArgs {
    /// Output verbosity selected by the flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Validate the arguments into runtime settings
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let pip = self.pip.trim();
        if pip.is_empty() {
            return Err(ConfigError::EmptyPackageManager);
        }

        let url = reqwest::Url::parse(self.index_url.trim()).map_err(|e| {
            ConfigError::InvalidIndexUrl {
                value: self.index_url.clone(),
                message: e.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidIndexUrl {
                value: self.index_url.clone(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(Settings {
            pip: pip.to_string(),
            index_url: self.index_url.trim().trim_end_matches('/').to_string(),
            timeout: self.timeout,
            retries: self.retries,
            output: OutputConfig::from_cli(self.json, self.verbose, self.quiet),
        })
    }
}
