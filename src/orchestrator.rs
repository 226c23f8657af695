//! Workflow coordination for the `check`, `install` and `doctor` commands
//!
//! This module provides:
//! - Wiring of the PyPI index, pip and the compatibility checker from settings
//! - check: pip check → inventory → compatibility check
//! - install: inventory → newest-first scan → pip install (unless dry-run)
//! - Outcome types carrying the exit code policy

use crate::checker::{CompatibilityCheck, CompatibilityChecker};
use crate::cli::Settings;
use crate::domain::{CompatibilityReport, InventoryStatus};
use crate::error::{AppError, CheckError, RegistryError};
use crate::output::{OutputFormat, Verbosity};
use crate::package_manager::{
    EnvironmentReport, InstallResult, PackageManager, SystemPackageManager,
};
use crate::progress::Progress;
use crate::registry::{HttpClient, PackageIndex, PyPIAdapter};
use crate::selector::{find_best_compatible_version, Selection};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Exit code when a decision was reached and it is negative
pub const EXIT_FAILURE: u8 = 1;

/// Exit code when the index could not be asked
pub const EXIT_ERROR: u8 = 2;

/// Verdict of a `check` run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// No conflicts with installed packages
    Compatible,
    /// At least one installed package violates a declared range
    Incompatible,
    /// The index has no such package or release
    NotFound,
    /// The index could not be reached or answered garbage
    Failed,
}

/// Result of a `check` run
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub package: String,
    pub version: String,
    pub status: CheckStatus,
    pub inventory: InventoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CompatibilityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self.status {
            CheckStatus::Compatible => 0,
            CheckStatus::Incompatible | CheckStatus::NotFound => EXIT_FAILURE,
            CheckStatus::Failed => EXIT_ERROR,
        }
    }
}

/// Verdict of an `install` run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    /// A compatible version was found and installed
    Installed,
    /// A compatible version was found; dry-run skipped the install
    WouldInstall,
    /// Every published version conflicts (or none exist)
    NoCompatibleVersion,
    /// The index does not know the package
    NotFound,
    /// pip install exited unsuccessfully
    InstallFailed,
    /// The index could not be reached or answered garbage
    Failed,
}

/// Result of an `install` run
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
    pub package: String,
    pub dry_run: bool,
    pub status: InstallStatus,
    pub inventory: InventoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self.status {
            InstallStatus::Installed | InstallStatus::WouldInstall => 0,
            InstallStatus::NoCompatibleVersion
            | InstallStatus::NotFound
            | InstallStatus::InstallFailed => EXIT_FAILURE,
            InstallStatus::Failed => EXIT_ERROR,
        }
    }
}

/// Coordinates the index, pip and the checker for one CLI invocation
pub struct Orchestrator {
    settings: Settings,
    index: Arc<dyn PackageIndex>,
    package_manager: Box<dyn PackageManager>,
}

impl Orchestrator {
    /// Build an orchestrator talking to the configured index and pip
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        let client =
            HttpClient::with_timeout(settings.timeout)?.with_max_retries(settings.retries);
        let index = Arc::new(PyPIAdapter::with_base_url(client, settings.index_url.clone()));
        let package_manager = Box::new(SystemPackageManager::with_program(settings.pip.clone()));

        Ok(Self::with_components(settings, index, package_manager))
    }

    /// Build an orchestrator from explicit collaborators
    pub fn with_components(
        settings: Settings,
        index: Arc<dyn PackageIndex>,
        package_manager: Box<dyn PackageManager>,
    ) -> Self {
        Self {
            settings,
            index,
            package_manager,
        }
    }

    fn progress(&self) -> Progress {
        let output = &self.settings.output;
        Progress::new(
            output.format == OutputFormat::Text && output.verbosity == Verbosity::Normal,
        )
    }

    fn checker(&self) -> CompatibilityChecker {
        let python = self.package_manager.python_version();
        match python {
            Some(ref python) => debug!("Evaluating markers for Python {}", python),
            None => debug!("Python version unknown; version markers are assumed to apply"),
        }
        CompatibilityChecker::new(self.index.clone()).with_python(python)
    }

    /// Check one exact release against the installed packages
    pub async fn check(&self, package: &str, version: &str) -> CheckOutcome {
        let mut progress = self.progress();

        progress.spinner("Checking environment...");
        let environment = self.package_manager.check_environment();
        for issue in environment.issues() {
            debug!("pip check: {}", issue);
        }

        progress.set_message("Reading installed packages...");
        let inventory = self.package_manager.list_installed();

        progress.set_message(&format!("Checking {} {}...", package, version));
        let checker = self.checker();
        let result = checker.check(package, version, &inventory).await;
        progress.finish_and_clear();

        let (status, report, error) = match result {
            Ok(report) if report.is_compatible() => (CheckStatus::Compatible, Some(report), None),
            Ok(report) => (CheckStatus::Incompatible, Some(report), None),
            Err(e @ CheckError::MetadataUnavailable { .. }) => {
                (CheckStatus::NotFound, None, Some(e.to_string()))
            }
            Err(e) => (CheckStatus::Failed, None, Some(e.to_string())),
        };

        CheckOutcome {
            package: package.to_string(),
            version: version.to_string(),
            status,
            inventory: inventory.status().clone(),
            environment: Some(environment),
            report,
            error,
        }
    }

    /// Select the newest compatible release and install it
    pub async fn install(&self, package: &str, dry_run: bool) -> InstallOutcome {
        let mut progress = self.progress();

        let environment = if self.settings.output.verbosity == Verbosity::Verbose {
            Some(self.package_manager.check_environment())
        } else {
            None
        };

        progress.spinner("Reading installed packages...");
        let inventory = self.package_manager.list_installed();

        progress.set_message(&format!("Searching for a compatible version of {}...", package));
        let checker = self.checker();
        let result =
            find_best_compatible_version(self.index.as_ref(), &checker, package, &inventory).await;
        progress.finish_and_clear();

        let mut outcome = InstallOutcome {
            package: package.to_string(),
            dry_run,
            status: InstallStatus::NoCompatibleVersion,
            inventory: inventory.status().clone(),
            environment,
            selection: None,
            install: None,
            error: None,
        };

        let selection = match result {
            Ok(Some(selection)) => selection,
            Ok(None) => return outcome,
            Err(e) => {
                outcome.status = match e {
                    RegistryError::PackageNotFound { .. } => InstallStatus::NotFound,
                    _ => InstallStatus::Failed,
                };
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        if dry_run {
            info!("Dry run: not installing {} {}", package, selection.version);
            outcome.status = InstallStatus::WouldInstall;
            outcome.selection = Some(selection);
            return outcome;
        }

        info!("Installing {} {}", package, selection.version);
        let install = self.package_manager.install(package, &selection.version);
        outcome.status = if install.success {
            InstallStatus::Installed
        } else {
            InstallStatus::InstallFailed
        };
        outcome.selection = Some(selection);
        outcome.install = Some(install);
        outcome
    }

    /// Report already-broken requirements in the environment
    pub fn doctor(&self) -> EnvironmentReport {
        self.package_manager.check_environment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InstalledPackage, Inventory, ReleaseMetadata};
    use crate::output::OutputConfig;
    use crate::package_manager::EnvironmentStatus;
    use async_trait::async_trait;
    use pep508_rs::pep440_rs::Version;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeIndex {
        versions: Vec<String>,
        releases: HashMap<String, Vec<String>>,
        offline: bool,
        timing_out: Option<&'static str>,
    }

    impl FakeIndex {
        fn new(releases: &[(&str, &[&str])]) -> Self {
            Self {
                versions: releases.iter().map(|(v, _)| v.to_string()).collect(),
                releases: releases
                    .iter()
                    .map(|(v, reqs)| (v.to_string(), reqs.iter().map(|r| r.to_string()).collect()))
                    .collect(),
                offline: false,
                timing_out: None,
            }
        }
    }

    #[async_trait]
    impl PackageIndex for FakeIndex {
        fn registry_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_release(
            &self,
            package: &str,
            version: &str,
        ) -> Result<ReleaseMetadata, RegistryError> {
            if self.offline {
                return Err(RegistryError::network_error(package, "fake", "offline"));
            }
            if self.timing_out == Some(version) {
                return Err(RegistryError::timeout(package, "fake"));
            }
            self.releases
                .get(version)
                .map(|reqs| ReleaseMetadata::new(package, version, reqs.clone()))
                .ok_or_else(|| RegistryError::package_not_found(package, "fake"))
        }

        async fn fetch_versions(&self, package: &str) -> Result<Vec<String>, RegistryError> {
            if self.offline {
                return Err(RegistryError::timeout(package, "fake"));
            }
            if self.versions.is_empty() {
                return Err(RegistryError::package_not_found(package, "fake"));
            }
            Ok(self.versions.clone())
        }
    }

    struct FakePip {
        installed: Vec<InstalledPackage>,
        python: Option<&'static str>,
        install_succeeds: bool,
        installs: Mutex<Vec<String>>,
    }

    impl FakePip {
        fn new(installed: &[(&str, &str)]) -> Self {
            Self {
                installed: installed
                    .iter()
                    .map(|(n, v)| InstalledPackage::new(*n, *v))
                    .collect(),
                python: None,
                install_succeeds: true,
                installs: Mutex::new(Vec::new()),
            }
        }
    }

    impl PackageManager for FakePip {
        fn list_installed(&self) -> Inventory {
            Inventory::new(self.installed.clone())
        }

        fn python_version(&self) -> Option<Version> {
            self.python.and_then(|v| v.parse().ok())
        }

        fn check_environment(&self) -> EnvironmentReport {
            EnvironmentReport {
                command: "pip check".to_string(),
                status: EnvironmentStatus::Healthy,
            }
        }

        fn install(&self, package: &str, version: &str) -> InstallResult {
            let spec = format!("{}=={}", package, version);
            self.installs.lock().unwrap().push(spec.clone());
            let command = format!("pip install {}", spec);
            if self.install_succeeds {
                InstallResult::success(package, version, command, String::new(), String::new())
            } else {
                InstallResult::failure(package, version, command, String::new(), "boom".into())
            }
        }
    }

    fn settings() -> Settings {
        Settings {
            pip: "pip".to_string(),
            index_url: "http://localhost".to_string(),
            timeout: Duration::from_secs(5),
            retries: 0,
            output: OutputConfig::new(OutputFormat::Json, Verbosity::Normal),
        }
    }

    fn orchestrator(index: FakeIndex, pip: FakePip) -> Orchestrator {
        Orchestrator::with_components(settings(), Arc::new(index), Box::new(pip))
    }

    #[tokio::test]
    async fn test_check_compatible() {
        let orch = orchestrator(
            FakeIndex::new(&[("2.0", &["numpy>=1.20"])]),
            FakePip::new(&[("numpy", "1.26.4")]),
        );
        let outcome = orch.check("pkg", "2.0").await;
        assert_eq!(outcome.status, CheckStatus::Compatible);
        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.environment.unwrap().is_healthy());
    }

    #[tokio::test]
    async fn test_check_incompatible() {
        let orch = orchestrator(
            FakeIndex::new(&[("2.0", &["numpy>=2.0"])]),
            FakePip::new(&[("numpy", "1.26.4")]),
        );
        let outcome = orch.check("pkg", "2.0").await;
        assert_eq!(outcome.status, CheckStatus::Incompatible);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.report.unwrap().conflicts.len(), 1);
    }

    #[tokio::test]
    async fn test_check_unknown_release() {
        let orch = orchestrator(FakeIndex::new(&[("2.0", &[])]), FakePip::new(&[]));
        let outcome = orch.check("pkg", "9.9").await;
        assert_eq!(outcome.status, CheckStatus::NotFound);
        assert_eq!(outcome.exit_code(), 1);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_check_network_failure_exits_2() {
        let mut index = FakeIndex::new(&[("2.0", &[])]);
        index.offline = true;
        let orch = orchestrator(index, FakePip::new(&[]));
        let outcome = orch.check("pkg", "2.0").await;
        assert_eq!(outcome.status, CheckStatus::Failed);
        assert_eq!(outcome.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_install_picks_newest_compatible() {
        let pip = FakePip::new(&[("numpy", "1.21.0")]);
        let index = FakeIndex::new(&[
            ("3.0", &["numpy>=2.0"]),
            ("2.0", &["numpy>=1.22"]),
            ("1.0", &["numpy>=1.20"]),
        ]);
        let orch = orchestrator(index, pip);

        let outcome = orch.install("pkg", false).await;
        assert_eq!(outcome.status, InstallStatus::Installed);
        assert_eq!(outcome.exit_code(), 0);
        let selection = outcome.selection.unwrap();
        assert_eq!(selection.version, "1.0");
        assert_eq!(selection.examined, 3);
        assert_eq!(outcome.install.unwrap().command, "pip install pkg==1.0");
    }

    #[tokio::test]
    async fn test_install_dry_run_does_not_install() {
        let index = FakeIndex::new(&[("2.0", &[])]);
        let pip = FakePip::new(&[]);
        let orch = Orchestrator::with_components(settings(), Arc::new(index), Box::new(pip));

        let outcome = orch.install("pkg", true).await;
        assert_eq!(outcome.status, InstallStatus::WouldInstall);
        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.install.is_none());
        assert_eq!(outcome.selection.unwrap().version, "2.0");
    }

    #[tokio::test]
    async fn test_install_no_compatible_version() {
        let orch = orchestrator(
            FakeIndex::new(&[("2.0", &["numpy>=2.0"]), ("1.0", &["numpy>=1.99"])]),
            FakePip::new(&[("numpy", "1.0")]),
        );
        let outcome = orch.install("pkg", false).await;
        assert_eq!(outcome.status, InstallStatus::NoCompatibleVersion);
        assert_eq!(outcome.exit_code(), 1);
        assert!(outcome.install.is_none());
    }

    #[tokio::test]
    async fn test_install_unknown_package() {
        let orch = orchestrator(FakeIndex::new(&[]), FakePip::new(&[]));
        let outcome = orch.install("nope", false).await;
        assert_eq!(outcome.status, InstallStatus::NotFound);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_install_failure() {
        let mut pip = FakePip::new(&[]);
        pip.install_succeeds = false;
        let orch = orchestrator(FakeIndex::new(&[("1.0", &[])]), pip);
        let outcome = orch.install("pkg", false).await;
        assert_eq!(outcome.status, InstallStatus::InstallFailed);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.install.unwrap().stderr, "boom");
    }

    #[tokio::test]
    async fn test_install_offline_exits_2() {
        let mut index = FakeIndex::new(&[("1.0", &[])]);
        index.offline = true;
        let orch = orchestrator(index, FakePip::new(&[]));
        let outcome = orch.install("pkg", false).await;
        assert_eq!(outcome.status, InstallStatus::Failed);
        assert_eq!(outcome.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_install_index_failure_mid_scan_exits_2() {
        let mut index = FakeIndex::new(&[("3.0", &[]), ("2.0", &[])]);
        index.timing_out = Some("3.0");
        let pip = FakePip::new(&[]);
        let orch = orchestrator(index, pip);

        let outcome = orch.install("pkg", false).await;
        assert_eq!(outcome.status, InstallStatus::Failed);
        assert_eq!(outcome.exit_code(), 2);
        assert!(outcome.selection.is_none());
        assert!(outcome.install.is_none());
    }

    #[tokio::test]
    async fn test_check_unverifiable_requirement_is_not_safe() {
        let orch = orchestrator(
            FakeIndex::new(&[("2.0", &["bar>=2.0"])]),
            FakePip::new(&[("bar", "legacy-ver")]),
        );
        let outcome = orch.check("pkg", "2.0").await;
        assert_eq!(outcome.status, CheckStatus::Incompatible);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.report.unwrap().unverifiable.len(), 1);
    }

    #[tokio::test]
    async fn test_markers_use_interpreter_version() {
        let requires: &[&str] = &[r#"numpy<2; python_version < "3.9""#];

        let mut pip = FakePip::new(&[("numpy", "2.1.0")]);
        pip.python = Some("3.12");
        let orch = orchestrator(FakeIndex::new(&[("2.0", requires)]), pip);
        assert_eq!(orch.check("pkg", "2.0").await.status, CheckStatus::Compatible);

        let mut pip = FakePip::new(&[("numpy", "2.1.0")]);
        pip.python = Some("3.8");
        let orch = orchestrator(FakeIndex::new(&[("2.0", requires)]), pip);
        assert_eq!(orch.check("pkg", "2.0").await.status, CheckStatus::Incompatible);
    }

    #[test]
    fn test_doctor() {
        let orch = orchestrator(FakeIndex::new(&[]), FakePip::new(&[]));
        assert!(orch.doctor().is_healthy());
    }
}
