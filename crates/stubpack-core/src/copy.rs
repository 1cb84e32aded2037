//! Filesystem copy and clear utilities.
//!
//! These back both no-archive mode and auxiliary copies:
//!
//! - [`copy_path`] mirrors a file, symlink or directory tree.
//! - [`clear_directory`] empties a directory while keeping it in place.
//!
//! File contents are streamed through a reusable [`CopyBuffer`] instead of
//! allocating per copy.

use crate::Result;
use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use walkdir::WalkDir;

/// Buffer size for file copies (64KB).
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Permission bits used for directories created while copying.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Reusable heap buffer for streaming file copies.
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Vec<u8>,
}

impl CopyBuffer {
    /// Creates a new copy buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; COPY_BUFFER_SIZE],
        }
    }

    /// Returns the buffer size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies everything from `reader` to `writer` through `buffer`.
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// Returns an error if reading or writing fails.
///
/// # Examples
///
/// ```
/// use stubpack_core::copy::CopyBuffer;
/// use stubpack_core::copy::copy_with_buffer;
///
/// let mut buffer = CopyBuffer::new();
/// let mut input: &[u8] = b"hello";
/// let mut output = Vec::new();
///
/// let copied = copy_with_buffer(&mut input, &mut output, &mut buffer)?;
/// assert_eq!(copied, 5);
/// assert_eq!(output, b"hello");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn copy_with_buffer<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
) -> io::Result<u64> {
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        writer.write_all(&buffer.buf[..bytes_read])?;
        total += bytes_read as u64;
    }

    Ok(total)
}

/// Copies `source` to `destination`.
///
/// - A symlink is recreated as an equivalent link.
/// - A regular file is byte-copied after creating missing parent
///   directories.
/// - A directory is mirrored recursively, creating directories with
///   `dir_mode`.
///
/// Existing files and links at the destination are replaced.
///
/// # Errors
///
/// Returns an error if `source` cannot be inspected or any copy step fails.
pub fn copy_path(
    source: &Path,
    destination: &Path,
    dir_mode: u32,
    buffer: &mut CopyBuffer,
) -> Result<()> {
    let metadata = fs::symlink_metadata(source)?;

    if metadata.file_type().is_symlink() {
        copy_symlink(source, destination, dir_mode, buffer)?;
    } else if metadata.is_dir() {
        copy_tree(source, destination, dir_mode, buffer)?;
    } else {
        copy_file(source, destination, dir_mode, buffer)?;
    }

    Ok(())
}

fn copy_tree(
    source: &Path,
    destination: &Path,
    dir_mode: u32,
    buffer: &mut CopyBuffer,
) -> io::Result<()> {
    create_dir_with_mode(destination, dir_mode)?;

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target, dir_mode, buffer)?;
        } else if file_type.is_dir() {
            create_dir_with_mode(&target, dir_mode)?;
        } else {
            copy_file(entry.path(), &target, dir_mode, buffer)?;
        }
    }

    Ok(())
}

fn copy_file(
    source: &Path,
    destination: &Path,
    dir_mode: u32,
    buffer: &mut CopyBuffer,
) -> io::Result<u64> {
    if let Some(parent) = destination.parent() {
        create_dir_with_mode(parent, dir_mode)?;
    }
    remove_existing_link(destination)?;

    let mut input = File::open(source)?;
    let mut output = File::create(destination)?;
    let copied = copy_with_buffer(&mut input, &mut output, buffer)?;
    output.flush()?;
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(
    source: &Path,
    destination: &Path,
    dir_mode: u32,
    _buffer: &mut CopyBuffer,
) -> io::Result<()> {
    let target = fs::read_link(source)?;
    if let Some(parent) = destination.parent() {
        create_dir_with_mode(parent, dir_mode)?;
    }
    if fs::symlink_metadata(destination).is_ok() {
        remove_any(destination)?;
    }
    std::os::unix::fs::symlink(target, destination)
}

#[cfg(not(unix))]
fn copy_symlink(
    source: &Path,
    destination: &Path,
    dir_mode: u32,
    buffer: &mut CopyBuffer,
) -> io::Result<()> {
    // No portable link creation; copy what the link points at
    if fs::metadata(source)?.is_dir() {
        copy_tree(source, destination, dir_mode, buffer)
    } else {
        copy_file(source, destination, dir_mode, buffer).map(|_| ())
    }
}

fn remove_existing_link(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => fs::remove_file(path),
        _ => Ok(()),
    }
}

fn remove_any(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(unix)]
fn create_dir_with_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if path.is_dir() {
        return Ok(());
    }
    fs::DirBuilder::new().recursive(true).mode(mode).create(path)
}

#[cfg(not(unix))]
fn create_dir_with_mode(path: &Path, _mode: u32) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Removes every entry under `path`, leaving `path` itself in place.
///
/// A missing `path` is not an error.
///
/// # Errors
///
/// Returns an error if `path` is not a directory or an entry cannot be
/// removed.
pub fn clear_directory(path: &Path) -> Result<()> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        remove_any(&entry.path())?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_copy_buffer_size() {
        assert_eq!(CopyBuffer::default().size(), COPY_BUFFER_SIZE);
    }

    #[test]
    fn test_copy_with_buffer_large_input() {
        let data = vec![7u8; COPY_BUFFER_SIZE * 3 + 11];
        let mut reader = Cursor::new(data.clone());
        let mut writer = Vec::new();
        let mut buffer = CopyBuffer::new();

        let copied = copy_with_buffer(&mut reader, &mut writer, &mut buffer).unwrap();
        assert_eq!(copied, data.len() as u64);
        assert_eq!(writer, data);
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        fs::write(&src, "alpha").unwrap();
        let dst = temp.path().join("out/deep/a.txt");

        copy_path(&src, &dst, DEFAULT_DIR_MODE, &mut CopyBuffer::new()).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "alpha");
    }

    #[test]
    fn test_copy_file_overwrites() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dst, "old and longer").unwrap();

        copy_path(&src, &dst, DEFAULT_DIR_MODE, &mut CopyBuffer::new()).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
    }

    #[test]
    fn test_copy_tree_mirrors() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("assets");
        fs::create_dir_all(src.join("css/empty")).unwrap();
        fs::write(src.join("css/site.css"), "body{}").unwrap();
        fs::write(src.join("logo.svg"), "<svg/>").unwrap();
        let dst = temp.path().join("dist/assets");

        copy_path(&src, &dst, DEFAULT_DIR_MODE, &mut CopyBuffer::new()).unwrap();
        assert_eq!(fs::read_to_string(dst.join("css/site.css")).unwrap(), "body{}");
        assert_eq!(fs::read_to_string(dst.join("logo.svg")).unwrap(), "<svg/>");
        assert!(dst.join("css/empty").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_symlink_recreated() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink("target.txt", &link).unwrap();
        let dst = temp.path().join("out/link");

        copy_path(&link, &dst, DEFAULT_DIR_MODE, &mut CopyBuffer::new()).unwrap();
        assert!(fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&dst).unwrap(), Path::new("target.txt"));

        // Copying again replaces the existing link
        copy_path(&link, &dst, DEFAULT_DIR_MODE, &mut CopyBuffer::new()).unwrap();
        assert_eq!(fs::read_link(&dst).unwrap(), Path::new("target.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_dir_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("inner")).unwrap();
        let dst = temp.path().join("dst");

        copy_path(&src, &dst, 0o700, &mut CopyBuffer::new()).unwrap();
        let mode = fs::metadata(dst.join("inner")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_copy_missing_source() {
        let temp = TempDir::new().unwrap();
        let result = copy_path(
            &temp.path().join("missing"),
            &temp.path().join("out"),
            DEFAULT_DIR_MODE,
            &mut CopyBuffer::new(),
        );
        assert!(matches!(result.unwrap_err(), crate::PackError::Io(_)));
    }

    #[test]
    fn test_clear_directory() {
        let temp = TempDir::new().unwrap();
        let dist = temp.path().join("dist");
        fs::create_dir_all(dist.join("nested/deeper")).unwrap();
        fs::write(dist.join("old.txt"), "old").unwrap();
        fs::write(dist.join("nested/deeper/x"), "x").unwrap();

        clear_directory(&dist).unwrap();
        assert!(dist.is_dir());
        assert_eq!(fs::read_dir(&dist).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_missing_directory_is_noop() {
        let temp = TempDir::new().unwrap();
        clear_directory(&temp.path().join("absent")).unwrap();
    }
}
