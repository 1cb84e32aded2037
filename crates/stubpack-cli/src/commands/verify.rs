//! Verify command implementation

use crate::cli::VerifyArgs;
use crate::error::convert_pack_error;
use crate::output::OutputFormatter;
use anyhow::Result;
use stubpack_core::verify_checksum;

pub fn execute(args: &VerifyArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let checksum = verify_checksum(&args.artifact).map_err(convert_pack_error)?;
    formatter.format_verification(&args.artifact, &checksum)
}
