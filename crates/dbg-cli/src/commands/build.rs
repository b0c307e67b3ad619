use camino::Utf8PathBuf;
use colored::Colorize;
use dbg_core::{build, BuildOptions, ObjectStore};
use miette::IntoDiagnostic;

use super::Context;
use crate::backend::DriverkitBackend;
use crate::feed::HttpFeed;
use crate::println_pad;

pub struct BuildConfigsArgs {
    pub bucket: Option<String>,
    pub skip_existing: bool,
    pub ignore_errors: bool,
    pub redirect_errors: Option<String>,
    pub publish: bool,
}

pub fn build_configs(ctx: Context, args: BuildConfigsArgs) -> miette::Result<()> {
    // The store is optional unless publishing: without one nothing is skipped.
    let store = if args.publish || args.bucket.is_some() || ctx.config.bucket.is_some() {
        Some(ctx.bucket(args.bucket.as_deref())?)
    } else {
        None
    };

    let backend = DriverkitBackend::new(HttpFeed::new().into_diagnostic()?);
    let opts = BuildOptions {
        options: ctx.options,
        skip_existing: args.skip_existing,
        ignore_errors: args.ignore_errors,
        redirect_errors: args.redirect_errors.map(Utf8PathBuf::from),
        publish: args.publish,
    };

    let report = build(
        &opts,
        &backend,
        store.as_ref().map(|s| s as &dyn ObjectStore),
    )
    .into_diagnostic()?;

    println_pad!(
        "{} {}  {} {}  {} {}  {} {}",
        "Built:".bright_green().bold(),
        report.built,
        "Skipped:".bright_yellow().bold(),
        report.skipped,
        "No outputs:".bright_yellow().bold(),
        report.no_outputs,
        "Failed:".bright_red().bold(),
        report.failed
    );
    Ok(())
}
