//! Compatibility check results

use serde::Serialize;
use std::fmt;

/// An installed package whose version violates a declared requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// Name of the dependency as declared by the candidate release
    pub dependency_name: String,
    /// Version currently installed
    pub installed_version: String,
    /// Range the candidate release requires
    pub required_range: String,
}

impl Conflict {
    pub fn new(
        dependency_name: impl Into<String>,
        installed_version: impl Into<String>,
        required_range: impl Into<String>,
    ) -> Self {
        Self {
            dependency_name: dependency_name.into(),
            installed_version: installed_version.into(),
            required_range: required_range.into(),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} is incompatible with {}",
            self.dependency_name, self.installed_version, self.required_range
        )
    }
}

/// A requirement that was not evaluated, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRequirement {
    /// Raw requirement string
    pub requirement: String,
    /// Why it was not evaluated
    pub reason: String,
}

impl SkippedRequirement {
    pub fn new(requirement: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            requirement: requirement.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of checking one candidate release against the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityReport {
    /// Candidate package
    pub package: String,
    /// Candidate version
    pub version: String,
    /// Conflicts with installed packages
    pub conflicts: Vec<Conflict>,
    /// Requirements that could not be parsed or point at a URL
    pub skipped: Vec<SkippedRequirement>,
    /// Requirements on installed packages whose range or installed version
    /// could not be evaluated
    pub unverifiable: Vec<SkippedRequirement>,
}

impl CompatibilityReport {
    /// Create an empty (compatible) report
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            conflicts: Vec::new(),
            skipped: Vec::new(),
            unverifiable: Vec::new(),
        }
    }

    /// Returns true if no conflicts were found and every requirement on an
    /// installed package could be evaluated
    pub fn is_compatible(&self) -> bool {
        self.conflicts.is_empty() && self.unverifiable.is_empty()
    }

    pub fn add_conflict(&mut self, conflict: Conflict) {
        self.conflicts.push(conflict);
    }

    pub fn add_skipped(&mut self, skipped: SkippedRequirement) {
        self.skipped.push(skipped);
    }

    pub fn add_unverifiable(&mut self, requirement: SkippedRequirement) {
        self.unverifiable.push(requirement);
    }
}

impl Serialize for CompatibilityReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("CompatibilityReport", 6)?;
        state.serialize_field("package", &self.package)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("compatible", &self.is_compatible())?;
        state.serialize_field("conflicts", &self.conflicts)?;
        if self.skipped.is_empty() {
            state.skip_field("skipped")?;
        } else {
            state.serialize_field("skipped", &self.skipped)?;
        }
        if self.unverifiable.is_empty() {
            state.skip_field("unverifiable")?;
        } else {
            state.serialize_field("unverifiable", &self.unverifiable)?;
        }
        state.end()
    }
}
