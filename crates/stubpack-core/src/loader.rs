//! Configuration file loading and option resolution.
//!
//! The project's `stubpack.json` is read into [`RawConfig`], an all-optional
//! mirror of the JSON document. [`resolve_options`] then layers three
//! sources into a typed [`Options`], later sources winning:
//!
//! 1. [`Options::default`]
//! 2. the configuration file
//! 3. command-line [`Overrides`]

use crate::PackError;
use crate::Result;
use crate::config::CompressMode;
use crate::config::ContainerFormat;
use crate::config::CopyEntry;
use crate::config::ExtensionPolicy;
use crate::config::Options;
use crate::config::StalePolicy;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

/// Name of the configuration file looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "stubpack.json";

/// Configuration file contents before validation.
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawConfig {
    /// Destination directory.
    pub dist: Option<String>,
    /// Artifact name. Empty selects no-archive mode.
    pub output: Option<String>,
    /// Entry point for the synthesized preamble.
    pub main: Option<String>,
    /// Directories to walk.
    pub directories: Option<Vec<String>>,
    /// Files to walk.
    pub files: Option<Vec<String>>,
    /// Inclusion patterns.
    pub rules: Option<Vec<String>>,
    /// Exclusion patterns.
    pub ignore: Option<Vec<String>>,
    /// Extra allowed extensions.
    pub extensions: Option<Vec<String>>,
    /// Custom preamble file.
    pub stub: Option<String>,
    /// Shebang interpreter.
    pub shebang: Option<String>,
    /// Compression mode name.
    pub compress: Option<String>,
    /// Container format name.
    pub format: Option<String>,
    /// Auxiliary copies.
    pub copy: Option<RawCopy>,
    /// Clear the dist directory before building.
    pub clear: Option<bool>,
    /// Extension policy name.
    pub extension_policy: Option<String>,
    /// Stale artifact policy name.
    pub stale_artifact: Option<String>,
    /// Record source permission bits.
    pub preserve_permissions: Option<bool>,
}

/// The `copy` key: a list of mirrored paths or a source-to-destination map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCopy {
    /// Each path is copied to the same relative path under dist.
    List(Vec<String>),
    /// Keys are source paths, values are destination paths.
    Map(serde_json::Map<String, serde_json::Value>),
}

impl RawCopy {
    /// Converts to copy entries, preserving document order.
    ///
    /// Map values that are not strings are skipped with a warning.
    #[must_use]
    pub fn into_entries(self) -> Vec<CopyEntry> {
        match self {
            Self::List(paths) => paths.into_iter().map(CopyEntry::mirrored).collect(),
            Self::Map(map) => map
                .into_iter()
                .filter_map(|(source, destination)| match destination {
                    serde_json::Value::String(destination) => {
                        Some(CopyEntry::new(source, destination))
                    }
                    other => {
                        tracing::warn!(
                            source = %source,
                            value = %other,
                            "ignoring copy entry with non-string destination"
                        );
                        None
                    }
                })
                .collect(),
        }
    }
}

/// Reads `stubpack.json` under `base_path`.
///
/// A missing or malformed file yields an empty configuration. Parse
/// failures are logged.
#[must_use]
pub fn load_configuration(base_path: &Path) -> RawConfig {
    match load_configuration_strict(base_path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring configuration file");
            RawConfig::default()
        }
    }
}

/// Reads `stubpack.json` under `base_path`, reporting parse failures.
///
/// A missing file still yields an empty configuration.
///
/// # Errors
///
/// Returns [`PackError::ConfigParse`] if the file is not a valid
/// configuration object, or an I/O error if it exists but cannot be read.
pub fn load_configuration_strict(base_path: &Path) -> Result<RawConfig> {
    let path = base_path.join(CONFIG_FILE_NAME);
    match read_config_file(&path) {
        Err(PackError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no configuration file");
            Ok(RawConfig::default())
        }
        other => other,
    }
}

/// Reads and parses the configuration file at `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read (including when it does
/// not exist) or [`PackError::ConfigParse`] if it is not a valid
/// configuration object.
pub fn read_config_file(path: &Path) -> Result<RawConfig> {
    let text = fs::read_to_string(path)?;
    let raw = serde_json::from_str(&text).map_err(|source| PackError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(raw)
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Destination directory.
    pub dist: Option<PathBuf>,
    /// Artifact name.
    pub output: Option<String>,
    /// Entry point.
    pub main: Option<String>,
    /// Custom preamble file.
    pub stub: Option<PathBuf>,
    /// Shebang interpreter.
    pub shebang: Option<String>,
    /// Compression mode.
    pub compress: Option<CompressMode>,
    /// Container format.
    pub format: Option<ContainerFormat>,
    /// Clear the dist directory first.
    pub clear: Option<bool>,
    /// Extension policy.
    pub extension_policy: Option<ExtensionPolicy>,
    /// Stale artifact policy.
    pub stale_policy: Option<StalePolicy>,
}

/// Layers defaults, `raw` and `overrides` into options rooted at
/// `base_path`.
///
/// Unknown compression names degrade to [`CompressMode::None`].
///
/// # Errors
///
/// Returns [`PackError::InvalidConfiguration`] for an unknown container
/// format or policy name.
///
/// # Examples
///
/// ```
/// use stubpack_core::CompressMode;
/// use stubpack_core::loader::Overrides;
/// use stubpack_core::loader::RawConfig;
/// use stubpack_core::loader::resolve_options;
/// use std::path::Path;
///
/// let raw: RawConfig = serde_json::from_str(
///     r#"{"output": "app.phar", "directories": ["src"], "compress": "gzip"}"#,
/// )?;
/// let overrides = Overrides {
///     compress: Some(CompressMode::Bzip2),
///     ..Overrides::default()
/// };
///
/// let options = resolve_options(Path::new("/project"), raw, overrides)?;
/// assert_eq!(options.output_name, "app.phar");
/// assert_eq!(options.compress, CompressMode::Bzip2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn resolve_options(base_path: &Path, raw: RawConfig, overrides: Overrides) -> Result<Options> {
    let mut options = Options::new(base_path);

    if let Some(dist) = raw.dist {
        options.dist_path = PathBuf::from(dist);
    }
    if let Some(output) = raw.output {
        options.output_name = output;
    }
    if let Some(main) = raw.main {
        options.main_entry = main;
    }
    if let Some(directories) = raw.directories {
        options.directories = directories;
    }
    if let Some(files) = raw.files {
        options.files = files;
    }
    if let Some(rules) = raw.rules {
        options.rules = rules;
    }
    if let Some(ignore) = raw.ignore {
        options.ignore = ignore;
    }
    if let Some(extensions) = raw.extensions {
        options.extensions = extensions;
    }
    options.stub_path = raw.stub.filter(|s| !s.is_empty()).map(PathBuf::from);
    options.shebang = raw.shebang.filter(|s| !s.trim().is_empty());
    if let Some(compress) = raw.compress {
        options.compress = CompressMode::parse_lenient(&compress);
    }
    if let Some(format) = raw.format {
        options.format = format.parse()?;
    }
    if let Some(copy) = raw.copy {
        options.copy = copy.into_entries();
    }
    if let Some(clear) = raw.clear {
        options.clear_before_build = clear;
    }
    if let Some(policy) = raw.extension_policy {
        options.extension_policy = policy.parse()?;
    }
    if let Some(policy) = raw.stale_artifact {
        options.stale_policy = policy.parse()?;
    }
    if let Some(preserve) = raw.preserve_permissions {
        options.preserve_permissions = preserve;
    }

    apply_overrides(&mut options, overrides);
    Ok(options)
}

fn apply_overrides(options: &mut Options, overrides: Overrides) {
    if let Some(dist) = overrides.dist {
        options.dist_path = dist;
    }
    if let Some(output) = overrides.output {
        options.output_name = output;
    }
    if let Some(main) = overrides.main {
        options.main_entry = main;
    }
    if let Some(stub) = overrides.stub {
        options.stub_path = Some(stub);
    }
    if let Some(shebang) = overrides.shebang {
        options.shebang = Some(shebang);
    }
    if let Some(compress) = overrides.compress {
        options.compress = compress;
    }
    if let Some(format) = overrides.format {
        options.format = format;
    }
    if let Some(clear) = overrides.clear {
        options.clear_before_build = clear;
    }
    if let Some(policy) = overrides.extension_policy {
        options.extension_policy = policy;
    }
    if let Some(policy) = overrides.stale_policy {
        options.stale_policy = policy;
    }
}
