//! Execution preamble written ahead of the container payload.

use crate::Result;
use crate::config::Options;
use std::fs;

/// Marker after which the loader stops parsing the artifact.
pub const HALT_MARKER: &str = "__HALT_COMPILER(); ?>";

/// Builds the loader that maps the artifact under `alias` and dispatches to
/// `main_entry`.
///
/// # Examples
///
/// ```
/// use stubpack_core::container::stub::default_preamble;
///
/// let stub = default_preamble("app.phar", "bin/run.php");
/// assert!(stub.contains("Phar::mapPhar('app.phar');"));
/// assert!(stub.contains("require 'phar://app.phar/bin/run.php';"));
/// assert!(stub.trim_end().ends_with("__HALT_COMPILER(); ?>"));
/// ```
#[must_use]
pub fn default_preamble(alias: &str, main_entry: &str) -> String {
    let alias = escape_single_quoted(alias);
    let main_entry = escape_single_quoted(main_entry.trim_start_matches('/'));
    format!(
        "<?php\nPhar::mapPhar('{alias}');\nrequire 'phar://{alias}/{main_entry}';\n{HALT_MARKER}\r\n"
    )
}

/// Prepends `#!/usr/bin/env <interpreter>` unless `preamble` already starts
/// with a shebang.
#[must_use]
pub fn with_shebang(interpreter: &str, preamble: Vec<u8>) -> Vec<u8> {
    if preamble.starts_with(b"#!") {
        return preamble;
    }
    let mut out = format!("#!/usr/bin/env {}\n", interpreter.trim()).into_bytes();
    out.extend_from_slice(&preamble);
    out
}

/// Resolves the preamble for a build: the custom stub file verbatim when
/// configured, the synthesized loader otherwise, then the optional shebang.
///
/// # Errors
///
/// Returns an I/O error if the custom stub cannot be read.
pub fn resolve_preamble(options: &Options) -> Result<Vec<u8>> {
    let preamble = match options.stub_file() {
        Some(path) => {
            tracing::debug!(stub = %path.display(), "using custom preamble");
            fs::read(&path)?
        }
        None => default_preamble(&options.output_name, &options.main_entry).into_bytes(),
    };

    Ok(match options.shebang.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(interpreter) => with_shebang(interpreter, preamble),
        None => preamble,
    })
}

fn escape_single_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
