//! Error types and handling for webassets
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for asset pipeline operations
#[derive(Error, Diagnostic, Debug)]
pub enum AssetError {
    // Alias errors
    #[error("Unknown alias: {token}")]
    #[diagnostic(
        code(webassets::alias::unknown),
        help("Register the alias with Aliases::set before resolving paths that use it")
    )]
    UnknownAlias { token: String },

    #[error("Alias resolution exceeded maximum depth for: {path}")]
    #[diagnostic(
        code(webassets::alias::depth_exceeded),
        help("An alias that expands to itself (directly or indirectly) is a configuration error")
    )]
    AliasDepthExceeded { path: String },

    // Bundle errors
    #[error("Bundle not found: {name}")]
    #[diagnostic(
        code(webassets::bundle::not_found),
        help("Check that the bundle is present in the registry passed to the manager")
    )]
    BundleNotFound { name: String },

    // Dependency errors
    #[error("Circular dependency detected: {chain}")]
    #[diagnostic(
        code(webassets::deps::circular),
        help("Remove the circular reference from the bundles' depends lists")
    )]
    CircularDependency { chain: String },

    // Publish errors
    #[error("The source path to be published does not exist: {path}")]
    #[diagnostic(
        code(webassets::publish::invalid_source),
        help("The bundle's source_path must resolve to an existing file or directory")
    )]
    InvalidSourcePath { path: String },

    #[error("Failed to publish {path}: {reason}")]
    #[diagnostic(code(webassets::publish::failed))]
    PublishFailed { path: String, reason: String },

    // Conversion errors
    #[error("Asset conversion command failed: {command}")]
    #[diagnostic(
        code(webassets::convert::failed),
        help("Check that the converter tool is installed and the source file is valid")
    )]
    ConversionFailed { command: String, output: String },

    // Configuration errors
    #[error("Failed to parse bundle configuration: {reason}")]
    #[diagnostic(code(webassets::config::parse_failed))]
    ConfigParseFailed { reason: String },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    #[diagnostic(code(webassets::config::invalid_pattern))]
    InvalidPattern { pattern: String, reason: String },

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(webassets::fs::read_failed))]
    FileReadFailed { path: String, reason: String },
}

impl AssetError {
    /// Publish failure wrapping an underlying I/O error
    pub fn publish_io(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::PublishFailed {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for AssetError {
    fn from(err: serde_yaml::Error) -> Self {
        AssetError::ConfigParseFailed {
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, AssetError>;
