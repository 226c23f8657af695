//! Version range matching using PEP 440 specifiers
//!
//! Ranges are comma-separated comparator clauses (`>=1.0,<2.0`). Each clause
//! is tokenized by the PEP 440 parser; nothing is ever evaluated as code.
//! Two legacy spellings are accepted on top of PEP 440:
//! - a bare `=1.2.3` clause or a clause without operator means `==1.2.3`
//! - a range wrapped in parentheses, `(>=1.0)`, as found in old metadata

use std::str::FromStr;

use pep508_rs::pep440_rs::{Version, VersionSpecifiers};

use crate::error::SpecifierError;

/// A parsed version range; an empty range accepts every version
#[derive(Debug, Clone)]
pub struct VersionRange {
    raw: String,
    specifiers: Option<VersionSpecifiers>,
}

impl VersionRange {
    /// Parse a version range expression
    pub fn parse(range: &str) -> Result<Self, SpecifierError> {
        let normalized = normalize_range(range);
        if normalized.is_empty() {
            return Ok(Self {
                raw: range.trim().to_string(),
                specifiers: None,
            });
        }

        let specifiers = VersionSpecifiers::from_str(&normalized).map_err(|e| {
            SpecifierError::InvalidSpecifier {
                range: range.trim().to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            raw: range.trim().to_string(),
            specifiers: Some(specifiers),
        })
    }

    /// Returns true if the range places no constraint
    pub fn is_any(&self) -> bool {
        self.specifiers.is_none()
    }

    /// The range as originally written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Test whether a version string falls inside the range
    pub fn contains(&self, version: &str) -> Result<bool, SpecifierError> {
        let Some(ref specifiers) = self.specifiers else {
            return Ok(true);
        };

        let version = parse_version(version)?;
        Ok(specifiers.contains(&version))
    }
}

/// Check whether an installed version satisfies a required range
pub fn is_compatible(
    installed_version: &str,
    required_range: &str,
) -> Result<bool, SpecifierError> {
    VersionRange::parse(required_range)?.contains(installed_version)
}

/// Parse a single PEP 440 version
pub fn parse_version(version: &str) -> Result<Version, SpecifierError> {
    Version::from_str(version.trim()).map_err(|e| SpecifierError::InvalidVersion {
        version: version.trim().to_string(),
        message: e.to_string(),
    })
}

/// Rewrite legacy spellings into PEP 440 clauses
fn normalize_range(range: &str) -> String {
    let mut range = range.trim();
    if let Some(inner) = range.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        range = inner.trim();
    }

    range
        .split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(|clause| {
            if clause.starts_with(|c: char| c.is_ascii_alphanumeric()) {
                format!("=={}", clause)
            } else if clause.starts_with('=') && !clause.starts_with("==") {
                format!("={}", clause)
            } else {
                clause.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
