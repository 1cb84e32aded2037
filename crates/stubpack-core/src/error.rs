//! Error types for packaging operations.

use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `PackError`.
pub type Result<T> = std::result::Result<T, PackError>;

/// Errors that can occur while selecting files or assembling an artifact.
#[derive(Error, Debug)]
pub enum PackError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A rule or ignore pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as written in the configuration.
        pattern: String,
        /// Underlying regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// The configured base path does not exist.
    #[error("base path not found: {path}")]
    BasePathNotFound {
        /// The missing base path.
        path: PathBuf,
    },

    /// The configured base path exists but is not a directory.
    #[error("base path is not a directory: {path}")]
    BasePathNotDirectory {
        /// The offending base path.
        path: PathBuf,
    },

    /// Configuration is inconsistent or incomplete.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// The configuration file exists but could not be parsed.
    #[error("malformed configuration file {path}: {source}")]
    ConfigParse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A stale artifact could not be removed before rebuilding.
    #[error("cannot remove stale artifact {path}: {source}")]
    StaleArtifact {
        /// Path of the artifact that should have been removed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The container writer rejected an entry or failed to finalize.
    #[error("container error: {reason}")]
    Container {
        /// Description of the failure.
        reason: String,
    },

    /// An artifact does not match its checksum sidecar.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Path of the verified artifact.
        path: PathBuf,
        /// Digest recorded in the sidecar.
        expected: String,
        /// Digest of the artifact bytes.
        actual: String,
    },
}

impl PackError {
    /// Returns `true` if this error is raised before any filesystem mutation.
    ///
    /// Configuration errors cover invalid patterns, an unusable base path and
    /// malformed configuration input.
    ///
    /// # Examples
    ///
    /// ```
    /// use stubpack_core::PackError;
    /// use std::path::PathBuf;
    ///
    /// let err = PackError::BasePathNotFound {
    ///     path: PathBuf::from("/missing"),
    /// };
    /// assert!(err.is_configuration_error());
    ///
    /// let err = PackError::Container {
    ///     reason: "finish failed".to_string(),
    /// };
    /// assert!(!err.is_configuration_error());
    /// ```
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPattern { .. }
                | Self::BasePathNotFound { .. }
                | Self::BasePathNotDirectory { .. }
                | Self::InvalidConfiguration { .. }
                | Self::ConfigParse { .. }
        )
    }

    /// Returns the filesystem path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::BasePathNotFound { path }
            | Self::BasePathNotDirectory { path }
            | Self::ConfigParse { path, .. }
            | Self::StaleArtifact { path, .. }
            | Self::ChecksumMismatch { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn container(err: impl std::fmt::Display) -> Self {
        Self::Container {
            reason: err.to_string(),
        }
    }
}
