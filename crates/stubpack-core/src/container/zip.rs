//! ZIP container with a leading preamble.
//!
//! The preamble is written first and the ZIP stream follows it in the same
//! buffer, so every local header and central directory offset is absolute
//! and the artifact stays readable by ordinary ZIP tools.

use super::Container;
use super::PendingEntry;
use crate::PackError;
use crate::Result;
use crate::config::CompressMode;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use zip::CompressionMethod;
use zip::DateTime;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Buffered ZIP container.
#[derive(Debug)]
pub struct ZipContainer {
    alias: String,
    preserve_permissions: bool,
    compression: CompressMode,
    preamble: Vec<u8>,
    entries: Vec<PendingEntry>,
}

impl ZipContainer {
    /// Creates an empty container. `alias` is stored as the archive comment.
    #[must_use]
    pub fn new(alias: &str, preserve_permissions: bool) -> Self {
        Self {
            alias: alias.to_string(),
            preserve_permissions,
            compression: CompressMode::None,
            preamble: Vec::new(),
            entries: Vec::new(),
        }
    }

    fn method(&self) -> CompressionMethod {
        match self.compression {
            CompressMode::None => CompressionMethod::Stored,
            CompressMode::Gzip => CompressionMethod::Deflated,
            CompressMode::Bzip2 => CompressionMethod::Bzip2,
        }
    }
}

impl Container for ZipContainer {
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
        let method = self.method();
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_all(&self.preamble)?;

        let mut zip = ZipWriter::new(cursor);
        zip.set_comment(self.alias.clone());

        for entry in &self.entries {
            // Fixed timestamp keeps repeated builds byte-identical
            let options = SimpleFileOptions::default()
                .compression_method(method)
                .last_modified_time(DateTime::default())
                .unix_permissions(entry.mode);

            zip.start_file(entry.path.as_str(), options)
                .map_err(PackError::container)?;
            zip.write_all(&entry.data)?;
            tracing::debug!(path = %entry.path, size = entry.data.len(), "zip entry written");
        }

        let cursor = zip.finish().map_err(PackError::container)?;
        Ok(cursor.into_inner())
    }
}
