//! Tar container with a leading preamble.
//!
//! The tar stream is compressed as a whole, so the configured compression
//! mode applies to every entry at once.

use super::Container;
use super::PendingEntry;
use crate::Result;
use crate::config::CompressMode;
use std::io::Write;
use std::path::Path;
use tar::Builder;
use tar::Header;

/// Buffered tar container.
#[derive(Debug)]
pub struct TarContainer {
    preserve_permissions: bool,
    compression: CompressMode,
    preamble: Vec<u8>,
    entries: Vec<PendingEntry>,
}

impl TarContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new(preserve_permissions: bool) -> Self {
        Self {
            preserve_permissions,
            compression: CompressMode::None,
            preamble: Vec::new(),
            entries: Vec::new(),
        }
    }
}

impl Container for TarContainer {
    fn add_entry(&mut self, path: &str, source: &Path) -> Result<()> {
        self.entries
            .push(PendingEntry::read(path, source, self.preserve_permissions)?);
        Ok(())
    }

    fn set_compression(&mut self, mode: CompressMode) {
        self.compression = mode;
    }

    fn set_preamble(&mut self, bytes: Vec<u8>) {
        self.preamble = bytes;
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>> {
        let Self {
            compression,
            preamble,
            entries,
            ..
        } = *self;

        let out = match compression {
            CompressMode::None => write_tar(preamble, &entries)?,
            CompressMode::Gzip => {
                let encoder =
                    flate2::write::GzEncoder::new(preamble, flate2::Compression::default());
                write_tar(encoder, &entries)?.finish()?
            }
            CompressMode::Bzip2 => {
                let encoder =
                    bzip2::write::BzEncoder::new(preamble, bzip2::Compression::default());
                write_tar(encoder, &entries)?.finish()?
            }
        };

        Ok(out)
    }
}

/// Appends every entry to a tar stream over `writer` and returns the writer.
fn write_tar<W: Write>(writer: W, entries: &[PendingEntry]) -> Result<W> {
    let mut builder = Builder::new(writer);

    for entry in entries {
        let mut header = Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(entry.data.len() as u64);
        header.set_mode(entry.mode);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        header.set_cksum();

        builder.append_data(&mut header, &entry.path, entry.data.as_slice())?;
        tracing::debug!(path = %entry.path, size = entry.data.len(), "tar entry written");
    }

    Ok(builder.into_inner()?)
}
