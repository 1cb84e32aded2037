//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;
use stubpack_core::ContainerFormat;

#[derive(Parser)]
#[command(name = "stubpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Log filter directive written to stderr (e.g. `info`, `stubpack_core=debug`)
    #[arg(long, global = true, default_value = "warn", value_name = "FILTER")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an archive or a mirrored tree from a project
    Build(BuildArgs),
    /// Verify an artifact against its checksum sidecar
    Verify(VerifyArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct BuildArgs {
    /// Project root (default: current directory)
    #[arg(value_name = "BASE_PATH", default_value = ".")]
    pub base_path: PathBuf,

    /// Configuration file (default: stubpack.json in the project root)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Destination directory, relative to the project root unless absolute
    #[arg(short, long, value_name = "DIR")]
    pub dist: Option<PathBuf>,

    /// Artifact file name; an empty value copies files instead
    #[arg(short, long, value_name = "NAME")]
    pub output: Option<String>,

    /// Entry point dispatched to by the generated preamble
    #[arg(short, long, value_name = "FILE")]
    pub main: Option<String>,

    /// Custom preamble file, used verbatim
    #[arg(long, value_name = "FILE")]
    pub stub: Option<PathBuf>,

    /// Prepend `#!/usr/bin/env <INTERP>` to the preamble
    #[arg(long, value_name = "INTERP")]
    pub shebang: Option<String>,

    /// Entry compression: none, gzip or bzip2 (unknown values store entries)
    #[arg(long, value_name = "MODE")]
    pub compress: Option<String>,

    /// Container layout
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    pub format: Option<ContainerFormat>,

    /// Remove everything in the destination directory first
    #[arg(long)]
    pub clear: bool,

    /// Fail when a stale artifact cannot be removed
    #[arg(long)]
    pub strict: bool,

    /// Archive every file that passes the rules, whatever its extension
    #[arg(long)]
    pub any_extension: bool,
}

#[derive(clap::Args)]
pub struct VerifyArgs {
    /// Path to the artifact
    #[arg(value_name = "ARTIFACT")]
    pub artifact: PathBuf,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_name = "SHELL", value_enum)]
    pub shell: Shell,
}

fn parse_format(s: &str) -> Result<ContainerFormat, String> {
    s.parse().map_err(|e: stubpack_core::PackError| e.to_string())
}
