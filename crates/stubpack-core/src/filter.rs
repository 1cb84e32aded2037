//! Path filtering for file selection.
//!
//! Two independent checks decide whether a candidate enters the manifest:
//!
//! - [`PathFilter`] applies the regex rule and ignore sets to relative paths,
//!   directories included.
//! - [`ExtensionFilter`] applies the extension policy to regular files only.
//!
//! Ignore always wins over rules.

use crate::PackError;
use crate::Result;
use crate::config::ExtensionPolicy;
use regex::Regex;
use regex::RegexBuilder;

/// Extensions archived under every policy.
pub const ALWAYS_ALLOWED_EXTENSIONS: [&str; 2] = ["php", "stub"];

/// Compiled rule and ignore sets.
///
/// # Examples
///
/// ```
/// use stubpack_core::filter::PathFilter;
///
/// let filter = PathFilter::new(&["\\.php$".to_string()], &["tests".to_string()])?;
///
/// assert!(filter.include("src/a.php"));
/// assert!(!filter.include("src/tests/b.php"));
/// assert!(!filter.include("README.md"));
/// # Ok::<(), stubpack_core::PackError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PathFilter {
    rules: Vec<Regex>,
    ignore: Vec<Regex>,
}

impl PathFilter {
    /// Compiles the rule and ignore patterns.
    ///
    /// Rules match anywhere in the path. Ignore patterns are anchored at a
    /// segment boundary: the start of the path or just after a `/`. Both are
    /// case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidPattern`] for the first pattern that fails
    /// to compile.
    pub fn new<S: AsRef<str>>(rules: &[S], ignore: &[S]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|pattern| compile(pattern.as_ref(), pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let ignore = ignore
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                compile(pattern, &format!("(?:^|/)(?:{pattern})"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules, ignore })
    }

    /// A filter that accepts every path.
    #[must_use]
    pub fn accept_all() -> Self {
        Self {
            rules: Vec::new(),
            ignore: Vec::new(),
        }
    }

    /// Returns `true` if any ignore pattern matches at the start of a segment
    /// of `path`.
    #[must_use]
    pub fn ignored(&self, path: &str) -> bool {
        self.ignore.iter().any(|re| re.is_match(path))
    }

    /// Returns `true` if the rule set is empty or any rule matches `path`.
    #[must_use]
    pub fn matches_rules(&self, path: &str) -> bool {
        self.rules.is_empty() || self.rules.iter().any(|re| re.is_match(path))
    }

    /// Returns `true` if `path` passes the rules and is not ignored.
    #[must_use]
    pub fn include(&self, path: &str) -> bool {
        self.matches_rules(path) && !self.ignored(path)
    }
}

fn compile(original: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| PackError::InvalidPattern {
            pattern: original.to_string(),
            source,
        })
}

/// Extension acceptance for regular files.
///
/// # Examples
///
/// ```
/// use stubpack_core::ExtensionPolicy;
/// use stubpack_core::filter::ExtensionFilter;
///
/// let filter = ExtensionFilter::new(ExtensionPolicy::Allowlist, &[".json".to_string()]);
/// assert!(filter.accepts("run.php"));
/// assert!(filter.accepts("config/app.JSON"));
/// assert!(!filter.accepts("README.md"));
///
/// let any = ExtensionFilter::new(ExtensionPolicy::Any, &[]);
/// assert!(any.accepts("README.md"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    policy: ExtensionPolicy,
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Creates a filter for `policy`. Extensions are normalized to lowercase
    /// without a leading dot.
    #[must_use]
    pub fn new(policy: ExtensionPolicy, extensions: &[String]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { policy, extensions }
    }

    /// Returns `true` if a file at `path` should be archived.
    #[must_use]
    pub fn accepts(&self, path: &str) -> bool {
        match self.policy {
            ExtensionPolicy::Any => true,
            ExtensionPolicy::Allowlist => extension_of(path).is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                ALWAYS_ALLOWED_EXTENSIONS.contains(&ext.as_str())
                    || self.extensions.iter().any(|allowed| *allowed == ext)
            }),
        }
    }
}

/// Returns the extension of the last path component, if any.
///
/// A leading dot alone (`.env`) does not start an extension.
fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => name.get(idx + 1..).filter(|ext| !ext.is_empty()),
    }
}
