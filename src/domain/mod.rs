//! Core domain models for pipguard
//!
//! This module contains the fundamental types used throughout the application:
//! - Installed packages and the inventory snapshot
//! - Dependency requirement strings and their parsed form
//! - Release metadata from the package index
//! - Compatibility reports and conflicts

mod package;
mod release;
mod report;
mod requirement;

pub use package::{normalize_name, InstalledPackage, Inventory, InventoryStatus};
pub use release::ReleaseMetadata;
pub use report::{CompatibilityReport, Conflict, SkippedRequirement};
pub use requirement::DependencyRequirement;
