//! Container abstraction for archive mode.
//!
//! A [`Container`] buffers entries, a compression mode and an execution
//! preamble, and produces the complete artifact bytes in one
//! [`Container::finalize`] call. Nothing is written to disk by a container;
//! the assembler persists the returned bytes atomically.
//!
//! Two layouts are provided:
//!
//! - [`ZipContainer`]: preamble followed by a ZIP stream, per-entry
//!   compression.
//! - [`TarContainer`]: preamble followed by a tar stream, whole-stream
//!   compression.

pub mod stub;
pub mod tar;
pub mod zip;

pub use self::tar::TarContainer;
pub use self::zip::ZipContainer;

use crate::Result;
use crate::config::CompressMode;
use crate::config::ContainerFormat;
use std::fs;
use std::path::Path;

/// Permission bits recorded when source permissions are not preserved.
pub const DEFAULT_ENTRY_MODE: u32 = 0o644;

/// Write-side operations required of an archive container.
pub trait Container {
    /// Buffers the contents of `source` under the archive path `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `source` cannot be read.
    fn add_entry(&mut self, path: &str, source: &Path) -> Result<()>;

    /// Sets the compression applied when the container is finalized.
    fn set_compression(&mut self, mode: CompressMode);

    /// Sets the bytes written ahead of the payload.
    fn set_preamble(&mut self, bytes: Vec<u8>);

    /// Number of buffered entries.
    fn len(&self) -> usize;

    /// Returns `true` if no entries are buffered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes preamble and entries into the final artifact bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer or compressor fails.
    fn finalize(self: Box<Self>) -> Result<Vec<u8>>;
}

/// Creates an empty container of the requested layout.
///
/// `alias` is the artifact's self-identifying name.
#[must_use]
pub fn new_container(
    format: ContainerFormat,
    alias: &str,
    preserve_permissions: bool,
) -> Box<dyn Container> {
    match format {
        ContainerFormat::Zip => Box::new(ZipContainer::new(alias, preserve_permissions)),
        ContainerFormat::Tar => Box::new(TarContainer::new(preserve_permissions)),
    }
}

/// An entry held in memory until the container is finalized.
#[derive(Debug, Clone)]
pub(crate) struct PendingEntry {
    pub path: String,
    pub data: Vec<u8>,
    pub mode: u32,
}

impl PendingEntry {
    pub(crate) fn read(path: &str, source: &Path, preserve_permissions: bool) -> Result<Self> {
        let data = fs::read(source)?;
        let mode = if preserve_permissions {
            source_mode(source)?
        } else {
            DEFAULT_ENTRY_MODE
        };
        Ok(Self {
            path: path.to_string(),
            data,
            mode,
        })
    }
}

#[cfg(unix)]
fn source_mode(source: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(source)?.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn source_mode(source: &Path) -> Result<u32> {
    let readonly = fs::metadata(source)?.permissions().readonly();
    Ok(if readonly { 0o444 } else { DEFAULT_ENTRY_MODE })
}
