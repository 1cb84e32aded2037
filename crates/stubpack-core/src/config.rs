//! Typed build configuration.
//!
//! [`Options`] is the immutable record consumed by the build pipeline. Raw
//! configuration files are parsed by [`crate::loader`] and converted into this
//! type before anything else looks at them.

use crate::PackError;
use crate::Result;
use crate::filter::PathFilter;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

/// Compression applied uniformly to every container entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompressMode {
    /// Entries are stored uncompressed.
    #[default]
    None,
    /// Deflate/gzip compression.
    Gzip,
    /// Bzip2 compression.
    Bzip2,
}

impl CompressMode {
    /// Parses a compression mode, degrading unknown names to `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stubpack_core::CompressMode;
    ///
    /// assert_eq!(CompressMode::parse_lenient("GZ"), CompressMode::Gzip);
    /// assert_eq!(CompressMode::parse_lenient("bzip2"), CompressMode::Bzip2);
    /// assert_eq!(CompressMode::parse_lenient("lzma"), CompressMode::None);
    /// ```
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|()| {
            tracing::warn!(mode = name, "unrecognized compression mode, storing entries uncompressed");
            Self::None
        })
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        }
    }
}

impl FromStr for CompressMode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "gzip" | "gz" => Ok(Self::Gzip),
            "bzip2" | "bz2" => Ok(Self::Bzip2),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CompressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container layout written in archive mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Preamble followed by a ZIP stream with per-entry compression.
    #[default]
    Zip,
    /// Preamble followed by a tar stream compressed as a whole.
    Tar,
}

impl FromStr for ContainerFormat {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            other => Err(PackError::InvalidConfiguration {
                reason: format!("unknown container format '{other}' (expected zip or tar)"),
            }),
        }
    }
}

/// Which regular files are archived once a path passes the rule filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtensionPolicy {
    /// Only `php`, `stub` and the configured extensions are archived.
    #[default]
    Allowlist,
    /// Every file accepted by the rule filter is archived.
    Any,
}

impl FromStr for ExtensionPolicy {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allowlist" => Ok(Self::Allowlist),
            "any" => Ok(Self::Any),
            other => Err(PackError::InvalidConfiguration {
                reason: format!("unknown extension policy '{other}' (expected allowlist or any)"),
            }),
        }
    }
}

/// How a pre-existing artifact at the output path is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Removal failures are logged and the build continues.
    #[default]
    BestEffort,
    /// Removal failures abort the build.
    Strict,
}

impl FromStr for StalePolicy {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "besteffort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            other => Err(PackError::InvalidConfiguration {
                reason: format!("unknown stale artifact policy '{other}' (expected best-effort or strict)"),
            }),
        }
    }
}

/// One auxiliary copy: `source` under the base path to `destination` under
/// the dist path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
    /// Path relative to the base path.
    pub source: String,
    /// Path relative to the dist path.
    pub destination: String,
}

impl CopyEntry {
    /// Creates an entry copying `source` to `destination`.
    #[must_use]
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Creates an entry whose destination equals its source.
    #[must_use]
    pub fn mirrored(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            destination: path.clone(),
            source: path,
        }
    }
}

/// Configuration for one build.
///
/// # Examples
///
/// ```
/// use stubpack_core::CompressMode;
/// use stubpack_core::Options;
///
/// let options = Options::new("/project")
///     .with_output_name("app.phar")
///     .with_directories(vec!["src".to_string()])
///     .with_ignore(vec!["src/tests".to_string()])
///     .with_compress(CompressMode::Gzip);
///
/// assert!(options.is_archive_mode());
/// assert_eq!(options.dist_dir(), std::path::Path::new("/project/dist"));
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Project root every relative path is resolved against.
    pub base_path: PathBuf,

    /// Destination directory. Relative values resolve against `base_path`.
    ///
    /// Default: `dist`.
    pub dist_path: PathBuf,

    /// Artifact file name inside the dist directory. Empty selects
    /// no-archive mode, which mirrors the manifest into the dist directory.
    ///
    /// Default: empty.
    pub output_name: String,

    /// Entry point dispatched to by the synthesized preamble.
    ///
    /// Default: `index.php`.
    pub main_entry: String,

    /// Directories walked first, in order.
    pub directories: Vec<String>,

    /// Files walked after the directories, in order.
    pub files: Vec<String>,

    /// Inclusion patterns, unanchored and case-insensitive. Empty accepts
    /// every path.
    pub rules: Vec<String>,

    /// Exclusion patterns, anchored at the start of a path segment and
    /// case-insensitive.
    pub ignore: Vec<String>,

    /// Extensions archived in addition to `php` and `stub` under
    /// [`ExtensionPolicy::Allowlist`].
    pub extensions: Vec<String>,

    /// Custom preamble file, relative to `base_path` unless absolute.
    pub stub_path: Option<PathBuf>,

    /// Interpreter named in a `#!/usr/bin/env` line ahead of the preamble.
    pub shebang: Option<String>,

    /// Entry compression.
    pub compress: CompressMode,

    /// Container layout.
    pub format: ContainerFormat,

    /// Auxiliary copies applied after assembly, in order.
    pub copy: Vec<CopyEntry>,

    /// Remove everything under the dist directory before building.
    pub clear_before_build: bool,

    /// File extension acceptance strategy.
    pub extension_policy: ExtensionPolicy,

    /// Stale artifact removal strategy.
    pub stale_policy: StalePolicy,

    /// Record source permission bits in container entries.
    ///
    /// Default: `true`.
    pub preserve_permissions: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            dist_path: PathBuf::from("dist"),
            output_name: String::new(),
            main_entry: "index.php".to_string(),
            directories: Vec::new(),
            files: Vec::new(),
            rules: Vec::new(),
            ignore: Vec::new(),
            extensions: Vec::new(),
            stub_path: None,
            shebang: None,
            compress: CompressMode::None,
            format: ContainerFormat::Zip,
            copy: Vec::new(),
            clear_before_build: false,
            extension_policy: ExtensionPolicy::Allowlist,
            stale_policy: StalePolicy::BestEffort,
            preserve_permissions: true,
        }
    }
}

impl Options {
    /// Creates default options rooted at `base_path`.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Sets the dist path.
    #[must_use]
    pub fn with_dist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dist_path = path.into();
        self
    }

    /// Sets the artifact name. Empty selects no-archive mode.
    #[must_use]
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Sets the entry point used by the synthesized preamble.
    #[must_use]
    pub fn with_main_entry(mut self, main: impl Into<String>) -> Self {
        self.main_entry = main.into();
        self
    }

    /// Sets the directory list.
    #[must_use]
    pub fn with_directories(mut self, directories: Vec<String>) -> Self {
        self.directories = directories;
        self
    }

    /// Sets the file list.
    #[must_use]
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    /// Sets the inclusion patterns.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<String>) -> Self {
        self.rules = rules;
        self
    }

    /// Sets the exclusion patterns.
    #[must_use]
    pub fn with_ignore(mut self, ignore: Vec<String>) -> Self {
        self.ignore = ignore;
        self
    }

    /// Sets the extra allowed extensions.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Sets the custom preamble file.
    #[must_use]
    pub fn with_stub_path(mut self, stub: Option<PathBuf>) -> Self {
        self.stub_path = stub;
        self
    }

    /// Sets the shebang interpreter.
    #[must_use]
    pub fn with_shebang(mut self, interpreter: Option<String>) -> Self {
        self.shebang = interpreter;
        self
    }

    /// Sets the compression mode.
    #[must_use]
    pub fn with_compress(mut self, mode: CompressMode) -> Self {
        self.compress = mode;
        self
    }

    /// Sets the container format.
    #[must_use]
    pub fn with_format(mut self, format: ContainerFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the auxiliary copy list.
    #[must_use]
    pub fn with_copy(mut self, copy: Vec<CopyEntry>) -> Self {
        self.copy = copy;
        self
    }

    /// Sets whether the dist directory is cleared before building.
    #[must_use]
    pub fn with_clear_before_build(mut self, clear: bool) -> Self {
        self.clear_before_build = clear;
        self
    }

    /// Sets the extension policy.
    #[must_use]
    pub fn with_extension_policy(mut self, policy: ExtensionPolicy) -> Self {
        self.extension_policy = policy;
        self
    }

    /// Sets the stale artifact policy.
    #[must_use]
    pub fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_policy = policy;
        self
    }

    /// Sets whether permission bits are recorded in container entries.
    #[must_use]
    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Returns `true` when an artifact is produced rather than a copied tree.
    #[must_use]
    pub fn is_archive_mode(&self) -> bool {
        !self.output_name.is_empty()
    }

    /// Returns `true` when neither directories nor files are configured.
    #[must_use]
    pub fn has_no_sources(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    /// Returns the absolute dist directory.
    #[must_use]
    pub fn dist_dir(&self) -> PathBuf {
        resolve_under(&self.base_path, &self.dist_path)
    }

    /// Returns the artifact path in archive mode.
    #[must_use]
    pub fn output_path(&self) -> Option<PathBuf> {
        self.is_archive_mode()
            .then(|| self.dist_dir().join(&self.output_name))
    }

    /// Returns the absolute custom preamble path, if configured.
    #[must_use]
    pub fn stub_file(&self) -> Option<PathBuf> {
        self.stub_path
            .as_deref()
            .map(|stub| resolve_under(&self.base_path, stub))
    }

    /// Validates the configuration and compiles its path filter.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The base path is missing or not a directory
    /// - A rule or ignore pattern is not a valid regular expression
    pub fn validate(&self) -> Result<PathFilter> {
        if !self.base_path.exists() {
            return Err(PackError::BasePathNotFound {
                path: self.base_path.clone(),
            });
        }
        if !self.base_path.is_dir() {
            return Err(PackError::BasePathNotDirectory {
                path: self.base_path.clone(),
            });
        }
        if self.is_archive_mode() && self.output_name.contains(['/', '\\']) {
            return Err(PackError::InvalidConfiguration {
                reason: format!("output name '{}' must be a plain file name", self.output_name),
            });
        }
        PathFilter::new(self.rules.as_slice(), self.ignore.as_slice())
    }
}

fn resolve_under(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
