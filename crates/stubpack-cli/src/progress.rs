//! Progress bar implementation for CLI operations.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use stubpack_core::ProgressCallback;

/// CLI progress bar wrapper implementing `ProgressCallback`.
///
/// Shows the entry count and the path being packaged. The bar is cleared on
/// completion or drop.
pub struct CliProgress {
    bar: ProgressBar,
    started: bool,
}

impl CliProgress {
    /// Creates a hidden bar; its length is set by the first entry.
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(0);

        // Template: "Packaging [████████░░░░] 42/100 src/Foo.php"
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_prefix(message.to_string());

        Self {
            bar,
            started: false,
        }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_entry_start(&mut self, path: &str, total: usize, _current: usize) {
        if !self.started {
            self.bar.set_length(total as u64);
            self.started = true;
        }
        self.bar.set_message(path.to_string());
    }

    fn on_entry_complete(&mut self, _path: &str) {
        self.bar.inc(1);
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_callback() {
        let mut progress = CliProgress::new("Testing");

        progress.on_entry_start("src/a.php", 2, 1);
        progress.on_entry_complete("src/a.php");
        progress.on_entry_start("src/b.php", 2, 2);
        progress.on_entry_complete("src/b.php");

        assert_eq!(progress.bar.length(), Some(2));
        assert_eq!(progress.bar.position(), 2);
        progress.on_complete();
    }
}
