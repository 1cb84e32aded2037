//! High-level build entry points.
//!
//! A build runs its phases strictly in order and never goes back:
//!
//! 1. validate options and compile patterns (no filesystem mutation)
//! 2. create the dist directory
//! 3. clear the dist directory, if requested
//! 4. build the manifest
//! 5. assemble the artifact or the mirrored tree
//! 6. apply auxiliary copies
//! 7. report

use crate::Result;
use crate::assembler::assemble;
use crate::aux_copy::copy_aux;
use crate::config::Options;
use crate::copy::clear_directory;
use crate::manifest::ManifestBuilder;
use crate::progress::NoopProgress;
use crate::progress::ProgressCallback;
use crate::report::BuildOutcome;
use std::fs;
use std::time::Instant;

/// Runs a complete build.
///
/// Returns [`BuildOutcome::NothingToBuild`] without touching the filesystem
/// when neither directories nor files are configured.
///
/// # Errors
///
/// Returns an error if:
/// - The base path is missing or not a directory
/// - A rule or ignore pattern does not compile
/// - The dist directory cannot be created or cleared
/// - Assembly or an auxiliary copy fails
///
/// # Examples
///
/// ```no_run
/// use stubpack_core::BuildOutcome;
/// use stubpack_core::Options;
/// use stubpack_core::build;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = Options::new("./project")
///     .with_output_name("app.phar")
///     .with_directories(vec!["src".to_string()]);
///
/// if let BuildOutcome::Built(report) = build(&options)? {
///     println!("Packaged {} files", report.total_files);
/// }
/// # Ok(())
/// # }
/// ```
pub fn build(options: &Options) -> Result<BuildOutcome> {
    build_with_progress(options, &mut NoopProgress)
}

/// Runs a complete build, reporting per-entry progress.
///
/// # Errors
///
/// Same as [`build`].
pub fn build_with_progress(
    options: &Options,
    progress: &mut dyn ProgressCallback,
) -> Result<BuildOutcome> {
    let started = Instant::now();

    if options.has_no_sources() {
        tracing::warn!("no directories or files configured, nothing to build");
        return Ok(BuildOutcome::NothingToBuild);
    }

    let filter = options.validate()?;

    let dist = options.dist_dir();
    fs::create_dir_all(&dist)?;
    tracing::info!(dist = %dist.display(), "destination prepared");

    if options.clear_before_build {
        clear_directory(&dist)?;
        tracing::info!(dist = %dist.display(), "destination cleared");
    }

    let manifest = ManifestBuilder::new(options, &filter).build();
    tracing::info!(entries = manifest.len(), "manifest built");

    let mut report = assemble(&manifest, options, progress)?;
    tracing::info!(
        files = report.total_files,
        archive = options.is_archive_mode(),
        "assembled"
    );

    report.aux_copies = copy_aux(&options.copy, options)?;
    if report.aux_copies > 0 {
        tracing::info!(entries = report.aux_copies, "auxiliary copies applied");
    }

    report.duration = started.elapsed();
    tracing::info!(
        files = report.total_files,
        elapsed = report.elapsed_seconds(),
        "build finished"
    );

    Ok(BuildOutcome::Built(report))
}
