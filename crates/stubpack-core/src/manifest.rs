//! Ordered manifest of files selected for packaging.
//!
//! A [`Manifest`] maps archive-relative paths to absolute source paths in
//! insertion order. Re-inserting an existing relative path replaces its source
//! but keeps its original position.

use crate::Result;
use crate::config::Options;
use crate::filter::ExtensionFilter;
use crate::filter::PathFilter;
use crate::walker::TreeWalker;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

/// One selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Archive-internal path, forward-slash separated, no leading separator.
    pub relative_path: String,

    /// Absolute path the entry is read from.
    pub source_path: PathBuf,
}

/// Ordered, de-duplicated collection of [`ManifestEntry`].
///
/// # Examples
///
/// ```
/// use stubpack_core::Manifest;
///
/// let mut manifest = Manifest::new();
/// manifest.insert("src/a.php", "/p/src/a.php");
/// manifest.insert("run.php", "/p/run.php");
/// manifest.insert("src/a.php", "/other/a.php");
///
/// assert_eq!(manifest.len(), 2);
/// let paths: Vec<_> = manifest.iter().map(|e| e.relative_path.as_str()).collect();
/// assert_eq!(paths, ["src/a.php", "run.php"]);
/// assert_eq!(
///     manifest.get("src/a.php"),
///     Some(std::path::Path::new("/other/a.php"))
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    index: HashMap<String, usize>,
}

impl Manifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry. Returns the replaced source path.
    pub fn insert(
        &mut self,
        relative_path: impl Into<String>,
        source_path: impl Into<PathBuf>,
    ) -> Option<PathBuf> {
        let relative_path = relative_path.into();
        let source_path = source_path.into();

        if let Some(&idx) = self.index.get(&relative_path) {
            let previous = std::mem::replace(&mut self.entries[idx].source_path, source_path);
            return Some(previous);
        }

        self.index.insert(relative_path.clone(), self.entries.len());
        self.entries.push(ManifestEntry {
            relative_path,
            source_path,
        });
        None
    }

    /// Returns the source path recorded for `relative_path`.
    #[must_use]
    pub fn get(&self, relative_path: &str) -> Option<&Path> {
        self.index
            .get(relative_path)
            .map(|&idx| self.entries[idx].source_path.as_path())
    }

    /// Returns `true` if `relative_path` is present.
    #[must_use]
    pub fn contains(&self, relative_path: &str) -> bool {
        self.index.contains_key(relative_path)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the manifest has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Walks the configured directories, then the configured files, into one
/// manifest.
pub struct ManifestBuilder<'a> {
    options: &'a Options,
    filter: &'a PathFilter,
}

impl<'a> ManifestBuilder<'a> {
    /// Creates a builder over already validated options.
    #[must_use]
    pub fn new(options: &'a Options, filter: &'a PathFilter) -> Self {
        Self { options, filter }
    }

    /// Builds the manifest.
    ///
    /// Directories are walked before files, each list in configuration
    /// order. A later path colliding with an earlier one replaces its source.
    /// The dist directory is never walked.
    #[must_use]
    pub fn build(&self) -> Manifest {
        let extensions =
            ExtensionFilter::new(self.options.extension_policy, &self.options.extensions);
        let walker = TreeWalker::new(&self.options.base_path, self.filter, &extensions)
            .with_excluded(self.options.dist_dir());
        let mut manifest = Manifest::new();

        for configured in self.options.directories.iter().chain(&self.options.files) {
            let added = walker.walk(configured, &mut manifest);
            tracing::debug!(path = %configured, added, "walked source");
        }

        manifest
    }
}

/// Validates `options` and builds its manifest.
///
/// # Errors
///
/// Returns a configuration error if the base path is unusable or a pattern
/// does not compile.
///
/// # Examples
///
/// ```no_run
/// use stubpack_core::Options;
/// use stubpack_core::build_manifest;
///
/// let options = Options::new("./project").with_directories(vec!["src".to_string()]);
/// let manifest = build_manifest(&options)?;
/// for entry in &manifest {
///     println!("{} <- {}", entry.relative_path, entry.source_path.display());
/// }
/// # Ok::<(), stubpack_core::PackError>(())
/// ```
pub fn build_manifest(options: &Options) -> Result<Manifest> {
    let filter = options.validate()?;
    Ok(ManifestBuilder::new(options, &filter).build())
}
