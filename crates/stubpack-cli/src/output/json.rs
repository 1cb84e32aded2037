//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use stubpack_core::BuildReport;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct BuildOutput {
    mode: &'static str,
    dist: String,
    total_files: usize,
    aux_copies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
    duration_ms: u128,
    warnings: Vec<String>,
}

impl BuildOutput {
    fn new(dist: &Path, report: &BuildReport) -> Self {
        let archive = report.archive.as_ref();
        Self {
            mode: if archive.is_some() { "archive" } else { "copy" },
            dist: dist.display().to_string(),
            total_files: report.total_files,
            aux_copies: report.aux_copies,
            output_path: archive.map(|a| a.output_path.display().to_string()),
            size_bytes: archive.map(|a| a.size_bytes),
            checksum: archive.map(|a| a.checksum_hex.clone()),
            duration_ms: report.duration.as_millis(),
            warnings: report.warnings.clone(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_build_result(&self, dist: &Path, report: &BuildReport) -> Result<()> {
        Self::output(&JsonOutput::success("build", BuildOutput::new(dist, report)))
    }

    fn format_verification(&self, artifact: &Path, checksum: &str) -> Result<()> {
        #[derive(Serialize)]
        struct VerifyOutput {
            artifact: String,
            checksum: String,
        }

        let data = VerifyOutput {
            artifact: artifact.display().to_string(),
            checksum: checksum.to_string(),
        };
        Self::output(&JsonOutput::success("verify", data))
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::error("unknown", format!("{error:?}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }
}
