//! Dependency requirement strings as published in `requires_dist`
//!
//! Grammar (PEP 508 subset):
//! - `name`: letters, digits, `.`, `_`, `-`; starts and ends alphanumeric
//! - optional `[extra1,extra2]`
//! - optional version range, bare (`>=1.0,<2.0`) or parenthesized (`(>=1.0)`)
//! - optional `; marker` environment marker
//!
//! Markers are evaluated with `pep508_rs` against the target interpreter's
//! Python version and an empty set of extras. Markers on anything else
//! (platform, implementation) are assumed to apply.
//!
//! Examples: `requests>=2.28`, `foo[bar] (>=1.0) ; python_version < "3.11"`

use crate::error::RequirementError;
use pep508_rs::pep440_rs::Version;
use pep508_rs::{MarkerTree, MarkerTreeKind, MarkerValueVersion};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)").unwrap());
static EXTRA_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bextra\b").unwrap());

/// A parsed `requires_dist` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRequirement {
    /// Distribution name as written
    pub name: String,
    /// Requested extras, e.g. `["socks"]` for `requests[socks]`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    /// Version range with surrounding parentheses removed; empty means any
    pub range: String,
    /// Environment marker after `;`, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

impl DependencyRequirement {
    /// Parse a raw requirement string
    pub fn parse(raw: &str) -> Result<Self, RequirementError> {
        let (head, marker) = match raw.split_once(';') {
            Some((head, marker)) => {
                let marker = marker.trim();
                (head, (!marker.is_empty()).then(|| marker.to_string()))
            }
            None => (raw, None),
        };

        let head = head.trim();
        if head.is_empty() {
            return Err(RequirementError::Empty);
        }

        let name = NAME_RE
            .captures(head)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| RequirementError::InvalidName {
                requirement: raw.trim().to_string(),
            })?;
        let mut rest = head[name.end()..].trim_start();

        let mut extras = Vec::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let close = after_bracket
                .find(']')
                .ok_or_else(|| RequirementError::UnterminatedExtras {
                    requirement: raw.trim().to_string(),
                })?;
            extras = after_bracket[..close]
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from)
                .collect();
            rest = after_bracket[close + 1..].trim_start();
        }

        let mut range = rest.trim();
        if let Some(inner) = range.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            range = inner.trim();
        }

        Ok(Self {
            name: name.as_str().to_string(),
            extras,
            range: range.to_string(),
            marker,
        })
    }

    /// Returns true if the requirement only applies when an extra is requested
    pub fn is_extra_only(&self) -> bool {
        self.marker
            .as_deref()
            .is_some_and(|m| EXTRA_MARKER_RE.is_match(m))
    }

    /// Returns true if the requirement applies to an install without extras
    /// on the given Python version; `None` means the version is unknown
    pub fn applies_to(&self, python: Option<&Version>) -> bool {
        let Some(marker) = self.marker.as_deref() else {
            return true;
        };

        match marker.parse::<MarkerTree>() {
            Ok(tree) => marker_applies(&tree, python),
            Err(e) => {
                debug!("Could not parse marker '{}': {}", marker, e);
                !self.is_extra_only()
            }
        }
    }

    /// Returns true if the requirement is a direct URL reference (`name @ url`)
    pub fn is_url(&self) -> bool {
        self.range.starts_with('@')
    }
}

/// Walk a marker decision tree. Only Python version nodes are decided;
/// every other variable may take any value.
fn marker_applies(tree: &MarkerTree, python: Option<&Version>) -> bool {
    match tree.kind() {
        MarkerTreeKind::True => true,
        MarkerTreeKind::False => false,
        MarkerTreeKind::Version(marker) => {
            let is_python = matches!(
                marker.key(),
                MarkerValueVersion::PythonVersion | MarkerValueVersion::PythonFullVersion
            );
            marker.edges().any(|(range, child)| match python {
                Some(python) if is_python && !range.contains(python) => false,
                _ => marker_applies(&child, python),
            })
        }
        MarkerTreeKind::String(marker) => marker
            .children()
            .any(|(_, child)| marker_applies(&child, python)),
        MarkerTreeKind::In(marker) => marker
            .children()
            .any(|(_, child)| marker_applies(&child, python)),
        MarkerTreeKind::Contains(marker) => marker
            .children()
            .any(|(_, child)| marker_applies(&child, python)),
        MarkerTreeKind::Extra(marker) => marker_applies(&marker.edge(false), python),
    }
}

impl fmt::Display for DependencyRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        write!(f, "{}", self.range)?;
        if let Some(ref marker) = self.marker {
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}
