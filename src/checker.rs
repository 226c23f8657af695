//! Compatibility checking of a candidate release against the inventory
//!
//! For every `requires_dist` entry of the candidate release:
//! - unparseable entries and URL references are skipped
//! - requirements whose marker excludes the target interpreter, or that only
//!   apply with an extra, are ignored
//! - dependencies that are not installed are ignored
//! - installed dependencies are tested against the declared range; a range
//!   or installed version that cannot be evaluated makes the release
//!   unverifiable, and therefore not compatible
//!
//! Known limitation: a dependency that is not installed yet is never flagged,
//! so the checker cannot tell that installing the candidate would pull in a
//! new package.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{
    CompatibilityReport, Conflict, DependencyRequirement, Inventory, ReleaseMetadata,
    SkippedRequirement,
};
use crate::error::CheckError;
use crate::registry::PackageIndex;
use crate::version::VersionRange;
use pep508_rs::pep440_rs::Version;

/// Trait for anything that can decide whether a release fits the inventory
#[async_trait]
pub trait CompatibilityCheck: Send + Sync {
    /// Check one candidate release
    async fn check(
        &self,
        package: &str,
        version: &str,
        inventory: &Inventory,
    ) -> Result<CompatibilityReport, CheckError>;
}

/// Checker backed by a package index
pub struct CompatibilityChecker {
    index: Arc<dyn PackageIndex>,
    python: Option<Version>,
}

impl CompatibilityChecker {
    /// Create a checker that fetches metadata from the given index
    pub fn new(index: Arc<dyn PackageIndex>) -> Self {
        Self {
            index,
            python: None,
        }
    }

    /// Evaluate environment markers against this Python version
    pub fn with_python(mut self, python: Option<Version>) -> Self {
        self.python = python;
        self
    }
}

#[async_trait]
impl CompatibilityCheck for CompatibilityChecker {
    async fn check(
        &self,
        package: &str,
        version: &str,
        inventory: &Inventory,
    ) -> Result<CompatibilityReport, CheckError> {
        let release = self
            .index
            .fetch_release(package, version)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    CheckError::MetadataUnavailable {
                        package: package.to_string(),
                        version: version.to_string(),
                    }
                } else {
                    CheckError::Registry(e)
                }
            })?;

        Ok(evaluate_release(
            package,
            version,
            &release,
            inventory,
            self.python.as_ref(),
        ))
    }
}

/// Compare a release's declared requirements against the inventory
pub fn evaluate_release(
    package: &str,
    version: &str,
    release: &ReleaseMetadata,
    inventory: &Inventory,
    python: Option<&Version>,
) -> CompatibilityReport {
    let mut report = CompatibilityReport::new(package, version);

    for raw in &release.requires_dist {
        let requirement = match DependencyRequirement::parse(raw) {
            Ok(req) => req,
            Err(e) => {
                debug!("Skipping requirement '{}': {}", raw, e);
                report.add_skipped(SkippedRequirement::new(raw, e.to_string()));
                continue;
            }
        };

        if !requirement.applies_to(python) {
            debug!("Skipping '{}': marker does not apply", raw);
            continue;
        }

        let Some(installed) = inventory.get(&requirement.name) else {
            continue;
        };

        if requirement.is_url() {
            report.add_skipped(SkippedRequirement::new(raw, "direct URL reference"));
            continue;
        }

        let compatible = VersionRange::parse(&requirement.range)
            .and_then(|range| range.contains(&installed.version));

        match compatible {
            Ok(true) => {
                debug!(
                    "Checking {}: installed {}, required '{}' -> compatible",
                    requirement.name, installed.version, requirement.range
                );
            }
            Ok(false) => {
                debug!(
                    "Checking {}: installed {}, required '{}' -> incompatible",
                    requirement.name, installed.version, requirement.range
                );
                report.add_conflict(Conflict::new(
                    requirement.name.to_lowercase(),
                    &installed.version,
                    &requirement.range,
                ));
            }
            Err(e) => {
                warn!(
                    "Could not evaluate '{}' against installed {} {}: {}",
                    raw, requirement.name, installed.version, e
                );
                report.add_unverifiable(SkippedRequirement::new(raw, e.to_string()));
            }
        }
    }

    report
}
