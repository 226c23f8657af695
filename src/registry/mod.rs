//! Package index adapters
//!
//! This module provides:
//! - HTTP client shared foundation with timeout and retry logic
//! - PyPI JSON API adapter

mod client;
mod pypi;

pub use client::{HttpClient, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use pypi::{PyPIAdapter, DEFAULT_INDEX_URL};

use crate::domain::ReleaseMetadata;
use crate::error::RegistryError;
use async_trait::async_trait;

/// Trait for package index metadata services
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Get the registry name
    fn registry_name(&self) -> &'static str;

    /// Fetch the dependency manifest of one exact release
    async fn fetch_release(
        &self,
        package: &str,
        version: &str,
    ) -> Result<ReleaseMetadata, RegistryError>;

    /// Fetch every published version, newest first
    async fn fetch_versions(&self, package: &str) -> Result<Vec<String>, RegistryError>;
}
