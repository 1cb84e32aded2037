//! Build result reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Artifact details produced in archive mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Path of the written artifact.
    pub output_path: PathBuf,

    /// Size of the artifact in bytes.
    pub size_bytes: u64,

    /// Lowercase hex MD5 of the artifact bytes.
    pub checksum_hex: String,

    /// Path of the checksum sidecar.
    pub checksum_path: PathBuf,
}

/// Report of a completed build.
///
/// # Examples
///
/// ```
/// use stubpack_core::BuildReport;
/// use std::time::Duration;
///
/// let mut report = BuildReport::new();
/// report.total_files = 3;
/// report.duration = Duration::from_millis(1500);
///
/// assert!(!report.is_archive());
/// assert_eq!(report.elapsed_seconds(), 1.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Number of manifest entries packaged or copied.
    pub total_files: usize,

    /// Number of auxiliary copy entries applied.
    pub aux_copies: usize,

    /// Wall-clock duration of the whole build.
    pub duration: Duration,

    /// Artifact details, present in archive mode only.
    pub archive: Option<ArchiveSummary>,

    /// Non-fatal problems encountered during the build.
    pub warnings: Vec<String>,
}

impl BuildReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if an artifact was produced.
    #[must_use]
    pub fn is_archive(&self) -> bool {
        self.archive.is_some()
    }

    /// Build duration in seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Result of a build request.
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// Neither directories nor files were configured; nothing was touched.
    NothingToBuild,

    /// The build ran to completion.
    Built(BuildReport),
}

impl BuildOutcome {
    /// Returns the report if the build ran.
    #[must_use]
    pub fn report(&self) -> Option<&BuildReport> {
        match self {
            Self::NothingToBuild => None,
            Self::Built(report) => Some(report),
        }
    }

    /// Returns `true` if the build did not run.
    #[must_use]
    pub fn is_nothing_to_build(&self) -> bool {
        matches!(self, Self::NothingToBuild)
    }
}
