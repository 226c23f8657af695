//! PEP 440 version handling
//!
//! This module provides:
//! - Version range parsing and membership tests
//! - Newest-first ordering of published versions

mod ordering;
mod specifier;

pub use ordering::sort_descending;
pub use specifier::{is_compatible, parse_version, VersionRange};
