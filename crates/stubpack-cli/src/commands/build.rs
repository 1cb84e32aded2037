//! Build command implementation

use crate::cli::BuildArgs;
use crate::error::convert_pack_error;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use stubpack_core::BuildOutcome;
use stubpack_core::CompressMode;
use stubpack_core::ExtensionPolicy;
use stubpack_core::Options;
use stubpack_core::StalePolicy;
use stubpack_core::build;
use stubpack_core::build_with_progress;
use stubpack_core::loader;
use stubpack_core::loader::Overrides;

pub fn execute(args: &BuildArgs, formatter: &dyn OutputFormatter, show_progress: bool) -> Result<()> {
    let options = resolve(args)?;
    tracing::debug!(
        base = %options.base_path.display(),
        dist = %options.dist_dir().display(),
        archive = options.is_archive_mode(),
        "resolved build options"
    );

    let outcome = if show_progress && CliProgress::should_show() {
        let label = if options.is_archive_mode() {
            "Packaging"
        } else {
            "Copying"
        };
        let mut progress = CliProgress::new(label);
        build_with_progress(&options, &mut progress)
    } else {
        build(&options)
    }
    .map_err(convert_pack_error)?;

    match outcome {
        BuildOutcome::NothingToBuild => {
            formatter.format_warning("No directories or files configured, nothing to build");
            Ok(())
        }
        BuildOutcome::Built(report) => formatter.format_build_result(&options.dist_dir(), &report),
    }
}

/// Layers the configuration file and command-line flags into build options.
fn resolve(args: &BuildArgs) -> Result<Options> {
    let raw = match &args.config {
        Some(path) => loader::read_config_file(path).map_err(convert_pack_error)?,
        None => loader::load_configuration(&args.base_path),
    };

    let overrides = Overrides {
        dist: args.dist.clone(),
        output: args.output.clone(),
        main: args.main.clone(),
        stub: args.stub.clone(),
        shebang: args.shebang.clone(),
        compress: args.compress.as_deref().map(CompressMode::parse_lenient),
        format: args.format,
        clear: args.clear.then_some(true),
        extension_policy: args.any_extension.then_some(ExtensionPolicy::Any),
        stale_policy: args.strict.then_some(StalePolicy::Strict),
    };

    loader::resolve_options(&args.base_path, raw, overrides).map_err(convert_pack_error)
}
