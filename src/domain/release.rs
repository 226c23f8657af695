//! Release metadata from the package index

use serde::{Deserialize, Serialize};

/// Dependency manifest of a single published release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    /// Package name
    pub name: String,
    /// Release version
    pub version: String,
    /// Raw `requires_dist` entries, empty when the index lists none
    pub requires_dist: Vec<String>,
}

impl ReleaseMetadata {
    /// Create release metadata
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        requires_dist: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            requires_dist,
        }
    }
}
