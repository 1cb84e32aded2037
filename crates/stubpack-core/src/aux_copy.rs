//! Auxiliary copies applied after assembly.

use crate::Result;
use crate::config::CopyEntry;
use crate::config::Options;
use crate::copy::CopyBuffer;
use crate::copy::DEFAULT_DIR_MODE;
use crate::copy::copy_path;

/// Copies every entry of `copy` from under the base path to under the dist
/// directory, in order. Returns the number of entries applied.
///
/// # Errors
///
/// Returns an I/O error if a source is missing or a copy fails. Entries
/// before the failing one stay in place.
pub fn copy_aux(copy: &[CopyEntry], options: &Options) -> Result<usize> {
    let dist = options.dist_dir();
    let mut buffer = CopyBuffer::new();

    for entry in copy {
        let source = options.base_path.join(entry.source.trim_start_matches('/'));
        let destination = dist.join(entry.destination.trim_start_matches('/'));
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            "auxiliary copy"
        );
        copy_path(&source, &destination, DEFAULT_DIR_MODE, &mut buffer)?;
    }

    Ok(copy.len())
}
