//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use std::path::Path;
use stubpack_core::BuildReport;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    /// The single completion line printed after a build.
    fn summary_line(dist: &Path, report: &BuildReport) -> String {
        let secs = report.elapsed_seconds();
        match &report.archive {
            Some(archive) => format!(
                "Built {} ({}, {} files) in {secs:.2}s",
                archive.output_path.display(),
                Self::format_size(archive.size_bytes),
                report.total_files
            ),
            None => format!(
                "Copied {} files to {} in {secs:.2}s",
                report.total_files,
                dist.display()
            ),
        }
    }

    fn write_success(&self, line: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {line}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(line);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_build_result(&self, dist: &Path, report: &BuildReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.write_success(&Self::summary_line(dist, report));

        if self.verbose {
            if let Some(archive) = &report.archive {
                let _ = self
                    .term
                    .write_line(&format!("  Checksum:   {}", archive.checksum_hex));
                let _ = self.term.write_line(&format!(
                    "  Sidecar:    {}",
                    archive.checksum_path.display()
                ));
            }
            if report.aux_copies > 0 {
                let _ = self
                    .term
                    .write_line(&format!("  Aux copies: {}", report.aux_copies));
            }
        }

        if report.has_warnings() {
            if self.use_colors {
                let _ = self
                    .term
                    .write_line(&format!("{}", style("Warnings:").yellow().bold()));
            } else {
                let _ = self.term.write_line("Warnings:");
            }
            for warning in &report.warnings {
                let _ = self.term.write_line(&format!("  - {warning}"));
            }
        }

        Ok(())
    }

    fn format_verification(&self, artifact: &Path, checksum: &str) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.write_success(&format!("{} OK", artifact.display()));
        if self.verbose {
            let _ = self.term.write_line(&format!("  MD5: {checksum}"));
        }
        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = term.write_line(&format!("WARNING: {message}"));
        }
    }
}
