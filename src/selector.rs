//! Best-version selection
//!
//! Walks every published version newest-first and stops at the first one the
//! compatibility check accepts. This is a greedy search: it does not consider
//! what installing the chosen version would require changing elsewhere.
//!
//! A release without metadata is skipped. Any other index failure ends the
//! scan, so a flaky index never causes an older release to be chosen.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checker::CompatibilityCheck;
use crate::domain::{CompatibilityReport, Inventory};
use crate::error::{CheckError, RegistryError};
use crate::registry::PackageIndex;

/// The version picked by the selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Chosen version
    pub version: String,
    /// Report of the check that accepted it
    pub report: CompatibilityReport,
    /// Number of candidates checked, including the chosen one
    pub examined: usize,
}

/// Find the newest published version of a package that fits the inventory
pub async fn find_best_compatible_version(
    index: &dyn PackageIndex,
    checker: &dyn CompatibilityCheck,
    package: &str,
    inventory: &Inventory,
) -> Result<Option<Selection>, RegistryError> {
    let versions = index.fetch_versions(package).await?;

    if versions.is_empty() {
        info!("No versions found for {}", package);
        return Ok(None);
    }

    select_from(checker, package, &versions, inventory).await
}

/// Scan candidate versions in the given order and return the first compatible one
pub async fn select_from(
    checker: &dyn CompatibilityCheck,
    package: &str,
    versions: &[String],
    inventory: &Inventory,
) -> Result<Option<Selection>, RegistryError> {
    for (idx, version) in versions.iter().enumerate() {
        debug!("Checking version {} for compatibility...", version);

        match checker.check(package, version, inventory).await {
            Ok(report) if report.is_compatible() => {
                info!("Found compatible version: {}", version);
                return Ok(Some(Selection {
                    version: version.clone(),
                    report,
                    examined: idx + 1,
                }));
            }
            Ok(report) => {
                for conflict in &report.conflicts {
                    debug!("{} {}: {}", package, version, conflict);
                }
                for requirement in &report.unverifiable {
                    debug!(
                        "{} {}: cannot evaluate {} ({})",
                        package, version, requirement.requirement, requirement.reason
                    );
                }
            }
            Err(e @ CheckError::MetadataUnavailable { .. }) => {
                warn!("Skipping {} {}: {}", package, version, e);
            }
            Err(CheckError::Registry(e)) => {
                warn!("Stopping search for {} at {}: {}", package, version, e);
                return Err(e);
            }
        }
    }

    info!("No compatible version found for {}", package);
    Ok(None)
}
