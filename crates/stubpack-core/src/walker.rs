//! Recursive traversal of configured paths into a manifest.
//!
//! The walker checks the [`PathFilter`] against every relative path before
//! looking at it on disk, so an excluded directory is never descended into.
//! Children are visited in file-name order. Paths that vanish, dangle or
//! cannot be read are skipped, never reported as errors. So are names that
//! are not valid UTF-8, and the excluded output directory.

use crate::filter::ExtensionFilter;
use crate::filter::PathFilter;
use crate::manifest::Manifest;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use walkdir::DirEntry;
use walkdir::WalkDir;

/// Walks configured paths below a base directory.
///
/// # Examples
///
/// ```no_run
/// use stubpack_core::ExtensionPolicy;
/// use stubpack_core::Manifest;
/// use stubpack_core::filter::ExtensionFilter;
/// use stubpack_core::filter::PathFilter;
/// use stubpack_core::walker::TreeWalker;
/// use std::path::Path;
///
/// let filter = PathFilter::new(&[], &["src/tests".to_string()])?;
/// let extensions = ExtensionFilter::new(ExtensionPolicy::Allowlist, &[]);
/// let walker = TreeWalker::new(Path::new("./project"), &filter, &extensions);
///
/// let mut manifest = Manifest::new();
/// walker.walk("src", &mut manifest);
/// # Ok::<(), stubpack_core::PackError>(())
/// ```
pub struct TreeWalker<'a> {
    base_path: &'a Path,
    filter: &'a PathFilter,
    extensions: &'a ExtensionFilter,
    excluded: Option<ExcludedDir>,
}

/// A directory pruned from every walk, kept both as given and resolved.
#[derive(Debug)]
struct ExcludedDir {
    path: PathBuf,
    canonical: Option<PathBuf>,
}

impl ExcludedDir {
    fn contains(&self, path: &Path) -> bool {
        if path.starts_with(&self.path) {
            return true;
        }
        self.canonical.as_ref().is_some_and(|canonical| {
            fs::canonicalize(path).is_ok_and(|resolved| resolved.starts_with(canonical))
        })
    }
}

impl<'a> TreeWalker<'a> {
    /// Creates a walker rooted at `base_path`.
    #[must_use]
    pub fn new(
        base_path: &'a Path,
        filter: &'a PathFilter,
        extensions: &'a ExtensionFilter,
    ) -> Self {
        Self {
            base_path,
            filter,
            extensions,
            excluded: None,
        }
    }

    /// Prunes `dir` and everything below it from every walk.
    ///
    /// Used for the dist directory, so earlier build output never feeds the
    /// next build. A directory that is the base path or one of its ancestors
    /// is not pruned.
    #[must_use]
    pub fn with_excluded(mut self, dir: impl Into<PathBuf>) -> Self {
        let path = dir.into();
        let canonical = fs::canonicalize(&path).ok();
        let base_canonical = fs::canonicalize(self.base_path).ok();

        let holds_base = self.base_path.starts_with(&path)
            || matches!((&canonical, &base_canonical), (Some(dir), Some(base)) if base.starts_with(dir));
        if holds_base {
            tracing::debug!(path = %path.display(), "excluded directory holds the base path, not pruning");
            return self;
        }

        self.excluded = Some(ExcludedDir { path, canonical });
        self
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded
            .as_ref()
            .is_some_and(|excluded| excluded.contains(path))
    }

    /// Adds every selected file under `configured` to `manifest`.
    ///
    /// Returns the number of entries added or replaced.
    pub fn walk(&self, configured: &str, manifest: &mut Manifest) -> usize {
        let root = normalize(configured);

        if !self.filter.include(&root) {
            tracing::debug!(path = %root, "skipped by filter");
            return 0;
        }

        let absolute = self.base_path.join(&root);
        if self.is_excluded(&absolute) {
            tracing::debug!(path = %root, "skipped excluded directory");
            return 0;
        }

        // Follows links, so dangling links land here too
        let metadata = match fs::metadata(&absolute) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(path = %root, error = %e, "skipped unreadable path");
                return 0;
            }
        };

        if metadata.is_file() {
            return usize::from(self.add_file(&root, &absolute, manifest));
        }

        if !metadata.is_dir() {
            tracing::debug!(path = %root, "skipped special file");
            return 0;
        }

        let mut added = 0;
        let entries = WalkDir::new(&absolute)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.descend(&root, &absolute, entry));

        for entry in entries {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if let Some(relative) = relative_path(&root, &absolute, &entry) {
                        added += usize::from(self.add_file(&relative, entry.path(), manifest));
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(root = %root, error = %e, "skipped unreadable entry");
                }
            }
        }

        added
    }

    fn descend(&self, root: &str, absolute_root: &Path, entry: &DirEntry) -> bool {
        let Some(relative) = relative_path(root, absolute_root, entry) else {
            tracing::debug!(path = %entry.path().display(), "skipped non UTF-8 name");
            return false;
        };
        if entry.file_type().is_dir() && self.is_excluded(entry.path()) {
            tracing::debug!(path = %relative, "skipped excluded directory");
            return false;
        }
        self.filter.include(&relative)
    }

    fn add_file(&self, relative: &str, absolute: &Path, manifest: &mut Manifest) -> bool {
        if !self.extensions.accepts(relative) {
            tracing::debug!(path = %relative, "skipped by extension policy");
            return false;
        }
        if manifest.insert(relative, absolute).is_some() {
            tracing::debug!(path = %relative, "replaced earlier manifest entry");
        }
        true
    }
}

/// Normalizes a configured path to forward slashes with no leading or
/// trailing separator.
///
/// # Examples
///
/// ```
/// use stubpack_core::walker::normalize;
///
/// assert_eq!(normalize("/src/"), "src");
/// assert_eq!(normalize("\\lib\\util"), "lib/util");
/// assert_eq!(normalize("run.php"), "run.php");
/// ```
#[must_use]
pub fn normalize(configured: &str) -> String {
    configured.replace('\\', "/").trim_matches('/').to_string()
}

/// Joins two relative path fragments with a single `/`.
#[must_use]
pub fn join_relative(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}/{child}")
    }
}

/// Relative path of `entry`, or `None` if any component is not valid UTF-8.
fn relative_path(root: &str, absolute_root: &Path, entry: &DirEntry) -> Option<String> {
    let suffix = entry
        .path()
        .strip_prefix(absolute_root)
        .unwrap_or_else(|_| entry.path());
    let suffix = suffix
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?
        .join("/");
    Some(join_relative(root, &suffix))
}
