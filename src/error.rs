//! Application error types using thiserror
//!
//! Error hierarchy:
//! - RegistryError: Issues with package index communication
//! - SpecifierError: Version or version range that cannot be evaluated
//! - RequirementError: Dependency requirement strings that do not parse
//! - CheckError: Why a compatibility check could not reach a verdict
//! - ConfigError: Issues with CLI configuration

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Package index related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Compatibility check errors
    #[error(transparent)]
    Check(#[from] CheckError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to package index communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package (or the requested release) not found in the index
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

/// Errors raised while evaluating a version against a version range
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecifierError {
    /// The installed version is not a valid PEP 440 version
    #[error("invalid version '{version}': {message}")]
    InvalidVersion { version: String, message: String },

    /// The version range is not a valid PEP 440 specifier set
    #[error("invalid version range '{range}': {message}")]
    InvalidSpecifier { range: String, message: String },
}

/// Errors raised while parsing a dependency requirement string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    /// Requirement string is blank
    #[error("empty requirement")]
    Empty,

    /// Requirement does not start with a valid distribution name
    #[error("requirement '{requirement}' does not start with a package name")]
    InvalidName { requirement: String },

    /// Extras list is not closed
    #[error("requirement '{requirement}' has an unterminated extras list")]
    UnterminatedExtras { requirement: String },
}

/// Errors that stop a compatibility check from reaching a verdict
#[derive(Error, Debug)]
pub enum CheckError {
    /// The index has no metadata for this package/version
    #[error("could not fetch metadata for {package} {version}")]
    MetadataUnavailable { package: String, version: String },

    /// Any other index failure (network, timeout, bad response)
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid index URL
    #[error("invalid index URL '{value}': {message}")]
    InvalidIndexUrl { value: String, message: String },

    /// Empty package manager executable
    #[error("package manager executable must not be empty")]
    EmptyPackageManager,
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Returns true if the index answered that the package does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::PackageNotFound { .. })
    }
}

impl CheckError {
    /// Returns true if the check failed because the release does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            CheckError::MetadataUnavailable { .. } => true,
            CheckError::Registry(e) => e.is_not_found(),
        }
    }
}
