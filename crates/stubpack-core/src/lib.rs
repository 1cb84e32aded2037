//! File selection and self-executing archive assembly.
//!
//! `stubpack-core` walks a project tree, selects files through regex
//! inclusion and exclusion rules, and either packages them into a single
//! artifact with an executable preamble or mirrors them into a destination
//! directory. Archive builds write an MD5 sidecar next to the artifact.
//!
//! # Examples
//!
//! ```no_run
//! use stubpack_core::BuildOutcome;
//! use stubpack_core::CompressMode;
//! use stubpack_core::Options;
//! use stubpack_core::build;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options::new("./project")
//!     .with_output_name("app.phar")
//!     .with_directories(vec!["src".to_string(), "vendor".to_string()])
//!     .with_ignore(vec!["vendor/bin".to_string()])
//!     .with_compress(CompressMode::Gzip);
//!
//! match build(&options)? {
//!     BuildOutcome::Built(report) => println!("Packaged {} files", report.total_files),
//!     BuildOutcome::NothingToBuild => println!("Nothing to build"),
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod assembler;
pub mod aux_copy;
pub mod build;
pub mod config;
pub mod container;
pub mod copy;
pub mod error;
pub mod filter;
pub mod loader;
pub mod manifest;
pub mod progress;
pub mod report;
pub mod walker;

// Re-export main API types
pub use assembler::assemble;
pub use assembler::verify_checksum;
pub use build::build;
pub use build::build_with_progress;
pub use config::CompressMode;
pub use config::ContainerFormat;
pub use config::CopyEntry;
pub use config::ExtensionPolicy;
pub use config::Options;
pub use config::StalePolicy;
pub use error::PackError;
pub use error::Result;
pub use filter::PathFilter;
pub use manifest::Manifest;
pub use manifest::ManifestBuilder;
pub use manifest::ManifestEntry;
pub use manifest::build_manifest;
pub use progress::NoopProgress;
pub use progress::ProgressCallback;
pub use report::ArchiveSummary;
pub use report::BuildOutcome;
pub use report::BuildReport;
pub use walker::TreeWalker;
