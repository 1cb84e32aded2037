//! Error conversion utilities for CLI.
//!
//! Converts stubpack-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use stubpack_core::PackError;

/// Converts `PackError` to a user-friendly anyhow error with context
pub fn convert_pack_error(err: PackError) -> anyhow::Error {
    match err {
        PackError::InvalidPattern { pattern, source } => {
            anyhow!(
                "Invalid pattern '{pattern}': {source}\n\
                 HINT: Rules and ignore entries are regular expressions; escape '.' and other metacharacters."
            )
        }
        PackError::BasePathNotFound { path } => {
            anyhow!(
                "Project directory not found: {}\n\
                 HINT: Pass the project root as BASE_PATH or run from inside it.",
                path.display()
            )
        }
        PackError::BasePathNotDirectory { path } => {
            anyhow!(
                "Project path is not a directory: {}\n\
                 HINT: BASE_PATH must point at the project root, not a file.",
                path.display()
            )
        }
        PackError::ConfigParse { path, source } => {
            anyhow!(
                "Malformed configuration file '{}': {source}\n\
                 HINT: The file must contain a single JSON object.",
                path.display()
            )
        }
        PackError::StaleArtifact { path, source } => {
            anyhow!(
                "Cannot remove previous artifact '{}': {source}\n\
                 HINT: Remove it manually or drop --strict to continue past removal failures.",
                path.display()
            )
        }
        PackError::ChecksumMismatch {
            path,
            expected,
            actual,
        } => {
            anyhow!(
                "Checksum mismatch for '{}'\n\
                 Expected: {expected}\n\
                 Actual:   {actual}\n\
                 HINT: The artifact was modified after it was built. Rebuild it.",
                path.display()
            )
        }
        PackError::Io(io_err) => anyhow!("I/O error: {io_err}"),
        _ => anyhow::Error::from(err),
    }
}
