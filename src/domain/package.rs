//! Installed packages and the inventory snapshot they form

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

/// Normalize a distribution name so that `Foo_Bar`, `foo-bar` and `foo.bar`
/// compare equal (PEP 503)
pub fn normalize_name(name: &str) -> String {
    SEPARATOR_RE.replace_all(name.trim(), "-").to_lowercase()
}

/// A package present in the local environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// Distribution name as reported by the package manager
    pub name: String,
    /// Installed version
    pub version: String,
}

impl InstalledPackage {
    /// Create a new installed package
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for InstalledPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Whether the inventory listing could be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InventoryStatus {
    /// The listing was read and parsed
    Complete,
    /// The listing could not be obtained; the inventory is empty
    Unreadable { reason: String },
}

/// Read-only snapshot of the installed packages
#[derive(Debug, Clone)]
pub struct Inventory {
    packages: Vec<InstalledPackage>,
    by_name: HashMap<String, usize>,
    status: InventoryStatus,
}

impl Inventory {
    /// Build a complete inventory from a package listing
    pub fn new(packages: Vec<InstalledPackage>) -> Self {
        let by_name = packages
            .iter()
            .enumerate()
            .map(|(idx, pkg)| (normalize_name(&pkg.name), idx))
            .collect();

        Self {
            packages,
            by_name,
            status: InventoryStatus::Complete,
        }
    }

    /// An empty inventory standing in for a listing that could not be read
    pub fn unreadable(reason: impl Into<String>) -> Self {
        Self {
            packages: Vec::new(),
            by_name: HashMap::new(),
            status: InventoryStatus::Unreadable {
                reason: reason.into(),
            },
        }
    }

    /// Look up an installed package by name, ignoring case and separators
    pub fn get(&self, name: &str) -> Option<&InstalledPackage> {
        self.by_name
            .get(&normalize_name(name))
            .map(|&idx| &self.packages[idx])
    }

    /// Installed version of a package, if present
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|pkg| pkg.version.as_str())
    }

    pub fn packages(&self) -> &[InstalledPackage] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn status(&self) -> &InventoryStatus {
        &self.status
    }

    /// Returns true if the listing could not be read
    pub fn is_unreadable(&self) -> bool {
        matches!(self.status, InventoryStatus::Unreadable { .. })
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FromIterator<InstalledPackage> for Inventory {
    fn from_iter<T: IntoIterator<Item = InstalledPackage>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
