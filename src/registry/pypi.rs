//! PyPI JSON API adapter
//!
//! Fetches release metadata and version lists from PyPI.
//! API endpoints:
//! - https://pypi.org/pypi/{package}/json
//! - https://pypi.org/pypi/{package}/{version}/json

use crate::domain::ReleaseMetadata;
use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageIndex};
use crate::version::sort_descending;
use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Default PyPI base URL
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org";

/// PyPI adapter
pub struct PyPIAdapter {
    client: HttpClient,
    base_url: String,
}

/// Response of the per-release endpoint
#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    info: ReleaseInfo,
}

/// `info` block of a release
#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    name: String,
    version: String,
    /// Null for packages without dependencies
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
}

/// Response of the per-project endpoint
#[derive(Debug, Deserialize)]
struct ProjectResponse {
    /// Release files keyed by version; only the keys are used
    releases: HashMap<String, IgnoredAny>,
}

impl PyPIAdapter {
    /// Create a new PyPI adapter against pypi.org
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, DEFAULT_INDEX_URL)
    }

    /// Create a PyPI adapter against a mirror or test server
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Build the URL listing every release of a package
    fn project_url(&self, package: &str) -> String {
        format!("{}/pypi/{}/json", self.base_url, package)
    }

    /// Build the URL of a single release
    fn release_url(&self, package: &str, version: &str) -> String {
        format!("{}/pypi/{}/{}/json", self.base_url, package, version)
    }
}

#[async_trait]
impl PackageIndex for PyPIAdapter {
    fn registry_name(&self) -> &'static str {
        "PyPI"
    }

    async fn fetch_release(
        &self,
        package: &str,
        version: &str,
    ) -> Result<ReleaseMetadata, RegistryError> {
        let url = self.release_url(package, version);
        let response: ReleaseResponse = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;

        let requires_dist = response.info.requires_dist.unwrap_or_default();
        debug!(
            "{} {} declares {} requirement(s)",
            response.info.name,
            response.info.version,
            requires_dist.len()
        );

        Ok(ReleaseMetadata::new(
            response.info.name,
            response.info.version,
            requires_dist,
        ))
    }

    async fn fetch_versions(&self, package: &str) -> Result<Vec<String>, RegistryError> {
        let url = self.project_url(package);
        let response: ProjectResponse = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;

        let versions = sort_descending(response.releases.into_keys());
        debug!("Found {} versions for package {}", versions.len(), package);

        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn adapter_for(server: &Server) -> PyPIAdapter {
        PyPIAdapter::with_base_url(HttpClient::new().unwrap(), server.url())
    }

    #[test]
    fn test_pypi_adapter_registry_name() {
        let adapter = PyPIAdapter::new(HttpClient::new().unwrap());
        assert_eq!(adapter.registry_name(), "PyPI");
    }

    #[test]
    fn test_project_url() {
        let adapter = PyPIAdapter::new(HttpClient::new().unwrap());
        assert_eq!(
            adapter.project_url("requests"),
            "https://pypi.org/pypi/requests/json"
        );
    }

    #[test]
    fn test_release_url() {
        let adapter = PyPIAdapter::new(HttpClient::new().unwrap());
        assert_eq!(
            adapter.release_url("numpy", "1.21.0"),
            "https://pypi.org/pypi/numpy/1.21.0/json"
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let adapter =
            PyPIAdapter::with_base_url(HttpClient::new().unwrap(), "https://mirror.example/");
        assert_eq!(
            adapter.project_url("flask-restful"),
            "https://mirror.example/pypi/flask-restful/json"
        );
    }

    #[tokio::test]
    async fn test_fetch_release_returns_requires_dist() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/pandas/2.2.0/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "info": {
                        "name": "pandas",
                        "version": "2.2.0",
                        "requires_dist": ["numpy>=1.22.4", "pytz>=2020.1"]
                    },
                    "urls": []
                }"#,
            )
            .create_async()
            .await;

        let release = adapter_for(&server)
            .fetch_release("pandas", "2.2.0")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(release.name, "pandas");
        assert_eq!(release.version, "2.2.0");
        assert_eq!(release.requires_dist, vec!["numpy>=1.22.4", "pytz>=2020.1"]);
    }

    #[tokio::test]
    async fn test_fetch_release_null_requires_dist() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/six/1.16.0/json")
            .with_status(200)
            .with_body(r#"{"info": {"name": "six", "version": "1.16.0", "requires_dist": null}}"#)
            .create_async()
            .await;

        let release = adapter_for(&server)
            .fetch_release("six", "1.16.0")
            .await
            .unwrap();

        assert!(release.requires_dist.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_release_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/numpy/99.0.0/json")
            .with_status(404)
            .create_async()
            .await;

        let err = adapter_for(&server)
            .fetch_release("numpy", "99.0.0")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_versions_sorted_newest_first() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/requests/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "info": {"version": "2.32.0"},
                    "releases": {
                        "2.9.0": [],
                        "2.31.0": [{"filename": "requests-2.31.0.tar.gz"}],
                        "2.32.0": [],
                        "2.32.0rc1": []
                    }
                }"#,
            )
            .create_async()
            .await;

        let versions = adapter_for(&server)
            .fetch_versions("requests")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(versions, vec!["2.32.0", "2.32.0rc1", "2.31.0", "2.9.0"]);
    }

    #[tokio::test]
    async fn test_fetch_versions_missing_package() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/nonexistent/json")
            .with_status(404)
            .create_async()
            .await;

        let err = adapter_for(&server)
            .fetch_versions("nonexistent")
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::PackageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_versions_malformed_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/weird/json")
            .with_status(200)
            .with_body(r#"{"info": {}}"#)
            .create_async()
            .await;

        let err = adapter_for(&server)
            .fetch_versions("weird")
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::InvalidResponse { .. }));
    }
}
