//! Turns a manifest into either a single artifact or a mirrored tree.
//!
//! Archive mode buffers every entry in a [`Container`], finalizes it in
//! memory and commits the bytes with a same-directory temporary file plus
//! rename. The checksum sidecar and the executable bits are applied after the
//! rename. No-archive mode copies each entry under the dist directory.

use crate::PackError;
use crate::Result;
use crate::config::Options;
use crate::config::StalePolicy;
use crate::container::Container;
use crate::container::new_container;
use crate::container::stub::resolve_preamble;
use crate::copy::CopyBuffer;
use crate::copy::DEFAULT_DIR_MODE;
use crate::copy::copy_path;
use crate::manifest::Manifest;
use crate::progress::ProgressCallback;
use crate::progress::ProgressTracker;
use crate::report::ArchiveSummary;
use crate::report::BuildReport;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Suffix appended to the artifact path to name its checksum sidecar.
pub const CHECKSUM_SUFFIX: &str = ".md5sum";

/// Permission bits applied to a finished artifact.
pub const ARTIFACT_MODE: u32 = 0o755;

/// Assembles `manifest` according to `options`.
///
/// The returned report carries the file count and, in archive mode, the
/// artifact summary. Its duration is left for the caller to fill in.
///
/// # Errors
///
/// Returns an error if the dist directory cannot be written, a source file
/// cannot be read, the container cannot be finalized, or (under
/// [`StalePolicy::Strict`]) a stale artifact cannot be removed.
pub fn assemble(
    manifest: &Manifest,
    options: &Options,
    progress: &mut dyn ProgressCallback,
) -> Result<BuildReport> {
    let mut report = BuildReport::new();
    report.total_files = manifest.len();

    match options.output_path() {
        Some(output_path) => {
            let summary =
                write_archive(manifest, options, &output_path, progress, &mut report)?;
            report.archive = Some(summary);
        }
        None => copy_tree(manifest, &options.dist_dir(), progress)?,
    }

    Ok(report)
}

fn write_archive(
    manifest: &Manifest,
    options: &Options,
    output_path: &Path,
    progress: &mut dyn ProgressCallback,
    report: &mut BuildReport,
) -> Result<ArchiveSummary> {
    if let Some(warning) = remove_stale(output_path, options.stale_policy)? {
        report.add_warning(warning);
    }

    let mut container = new_container(
        options.format,
        &options.output_name,
        options.preserve_permissions,
    );
    container.set_preamble(resolve_preamble(options)?);
    container.set_compression(options.compress);

    let mut tracker = ProgressTracker::new(progress, manifest.len());
    for entry in manifest {
        tracker.on_entry_start(&entry.relative_path);
        container.add_entry(&entry.relative_path, &entry.source_path)?;
        tracker.on_entry_complete(&entry.relative_path);
    }
    tracker.on_complete();

    let bytes = container.finalize()?;
    commit(output_path, &bytes)?;

    let checksum_hex = digest_hex(&bytes);
    let checksum_path = checksum_path(output_path);
    fs::write(&checksum_path, &checksum_hex)?;
    set_executable(output_path)?;

    tracing::info!(
        output = %output_path.display(),
        size = bytes.len(),
        checksum = %checksum_hex,
        "artifact written"
    );

    Ok(ArchiveSummary {
        output_path: output_path.to_path_buf(),
        size_bytes: bytes.len() as u64,
        checksum_hex,
        checksum_path,
    })
}

/// Removes an existing artifact at `path`.
///
/// Returns a warning message when removal failed but the policy allows the
/// build to continue.
fn remove_stale(path: &Path, policy: StalePolicy) -> Result<Option<String>> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed stale artifact");
            Ok(None)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => match policy {
            StalePolicy::Strict => Err(PackError::StaleArtifact {
                path: path.to_path_buf(),
                source,
            }),
            StalePolicy::BestEffort => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "could not remove stale artifact, continuing"
                );
                Ok(Some(format!(
                    "could not remove stale artifact {}: {source}",
                    path.display()
                )))
            }
        },
    }
}

/// Writes `bytes` to a temporary file beside `path` and renames it into place.
fn commit(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| PackError::Io(e.error))?;
    Ok(())
}

fn copy_tree(manifest: &Manifest, dist: &Path, progress: &mut dyn ProgressCallback) -> Result<()> {
    let mut buffer = CopyBuffer::new();
    let mut tracker = ProgressTracker::new(progress, manifest.len());

    for entry in manifest {
        tracker.on_entry_start(&entry.relative_path);
        let target = dist.join(&entry.relative_path);
        copy_path(&entry.source_path, &target, DEFAULT_DIR_MODE, &mut buffer)?;
        tracker.on_entry_complete(&entry.relative_path);
    }
    tracker.on_complete();

    tracing::info!(dist = %dist.display(), files = manifest.len(), "manifest copied");
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(ARTIFACT_MODE))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Lowercase hex MD5 of `bytes`.
///
/// # Examples
///
/// ```
/// use stubpack_core::assembler::digest_hex;
///
/// assert_eq!(digest_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
#[must_use]
pub fn digest_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Path of the checksum sidecar for `artifact`.
#[must_use]
pub fn checksum_path(artifact: &Path) -> PathBuf {
    let mut name = OsString::from(artifact.as_os_str());
    name.push(CHECKSUM_SUFFIX);
    PathBuf::from(name)
}

/// Recomputes the digest of `artifact` and compares it with its sidecar.
///
/// Returns the verified digest.
///
/// # Errors
///
/// Returns an I/O error if either file cannot be read, or
/// [`PackError::ChecksumMismatch`] if the digests differ.
pub fn verify_checksum(artifact: &Path) -> Result<String> {
    let expected = fs::read_to_string(checksum_path(artifact))?
        .trim()
        .to_ascii_lowercase();
    let actual = digest_hex(&fs::read(artifact)?);

    if expected != actual {
        return Err(PackError::ChecksumMismatch {
            path: artifact.to_path_buf(),
            expected,
            actual,
        });
    }

    Ok(actual)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CompressMode;
    use crate::progress::NoopProgress;
    use std::io::Cursor;
    use std::io::Read;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Manifest) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/sub")).unwrap();
        fs::write(temp.path().join("src/a.php"), "<?php echo 'a';").unwrap();
        fs::write(temp.path().join("src/sub/b.php"), "<?php echo 'b';").unwrap();
        fs::create_dir_all(temp.path().join("dist")).unwrap();

        let mut manifest = Manifest::new();
        manifest.insert("src/a.php", temp.path().join("src/a.php"));
        manifest.insert("src/sub/b.php", temp.path().join("src/sub/b.php"));
        (temp, manifest)
    }

    #[test]
    fn test_checksum_path() {
        assert_eq!(
            checksum_path(Path::new("dist/app.phar")),
            PathBuf::from("dist/app.phar.md5sum")
        );
    }

    #[test]
    fn test_assemble_archive() {
        let (temp, manifest) = fixture();
        let options = Options::new(temp.path())
            .with_output_name("app.phar")
            .with_compress(CompressMode::Gzip);

        let report = assemble(&manifest, &options, &mut NoopProgress).unwrap();
        let summary = report.archive.unwrap();
        assert_eq!(report.total_files, 2);
        assert_eq!(summary.output_path, temp.path().join("dist/app.phar"));

        let bytes = fs::read(&summary.output_path).unwrap();
        assert_eq!(summary.size_bytes, bytes.len() as u64);
        assert_eq!(summary.checksum_hex, digest_hex(&bytes));
        assert_eq!(
            fs::read_to_string(&summary.checksum_path).unwrap(),
            summary.checksum_hex
        );

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name("src/sub/b.php")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<?php echo 'b';");
    }

    #[cfg(unix)]
    #[test]
    fn test_artifact_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let (temp, manifest) = fixture();
        let options = Options::new(temp.path()).with_output_name("app.phar");
        assemble(&manifest, &options, &mut NoopProgress).unwrap();

        let mode = fs::metadata(temp.path().join("dist/app.phar"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, ARTIFACT_MODE);
    }

    #[test]
    fn test_stale_artifact_replaced() {
        let (temp, manifest) = fixture();
        fs::write(temp.path().join("dist/app.phar"), "stale").unwrap();
        let options = Options::new(temp.path())
            .with_output_name("app.phar")
            .with_stale_policy(StalePolicy::Strict);

        let report = assemble(&manifest, &options, &mut NoopProgress).unwrap();
        assert!(!report.has_warnings());
        assert_ne!(fs::read(temp.path().join("dist/app.phar")).unwrap(), b"stale");
    }

    #[test]
    fn test_stale_directory_strict_fails() {
        let (temp, manifest) = fixture();
        fs::create_dir_all(temp.path().join("dist/app.phar/inner")).unwrap();
        let options = Options::new(temp.path())
            .with_output_name("app.phar")
            .with_stale_policy(StalePolicy::Strict);

        let err = assemble(&manifest, &options, &mut NoopProgress).unwrap_err();
        assert!(matches!(err, PackError::StaleArtifact { .. }));
    }

    #[test]
    fn test_stale_directory_best_effort_continues() {
        let (temp, manifest) = fixture();
        fs::create_dir_all(temp.path().join("dist/app.phar/inner")).unwrap();
        let options = Options::new(temp.path()).with_output_name("app.phar");

        // Removal is skipped, then the rename over a directory fails later
        let err = assemble(&manifest, &options, &mut NoopProgress).unwrap_err();
        assert!(matches!(err, PackError::Io(_)));
    }

    #[test]
    fn test_assemble_no_archive_copies() {
        let (temp, manifest) = fixture();
        let options = Options::new(temp.path());

        let report = assemble(&manifest, &options, &mut NoopProgress).unwrap();
        assert!(report.archive.is_none());
        assert_eq!(report.total_files, 2);
        assert_eq!(
            fs::read(temp.path().join("dist/src/sub/b.php")).unwrap(),
            fs::read(temp.path().join("src/sub/b.php")).unwrap()
        );
    }

    #[test]
    fn test_verify_checksum() {
        let (temp, manifest) = fixture();
        let options = Options::new(temp.path()).with_output_name("app.phar");
        let report = assemble(&manifest, &options, &mut NoopProgress).unwrap();
        let artifact = temp.path().join("dist/app.phar");

        let digest = verify_checksum(&artifact).unwrap();
        assert_eq!(Some(digest), report.archive.map(|a| a.checksum_hex));

        fs::write(checksum_path(&artifact), "0".repeat(32)).unwrap();
        assert!(matches!(
            verify_checksum(&artifact).unwrap_err(),
            PackError::ChecksumMismatch { .. }
        ));
    }
}
