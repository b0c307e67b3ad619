use colored::Colorize;
use dbg_core::{generate, GenerateOptions};
use miette::IntoDiagnostic;

use super::Context;
use crate::backend::DriverkitBackend;
use crate::feed::HttpFeed;
use crate::println_pad;

pub struct GenerateConfigsArgs {
    pub auto: bool,
}

pub fn generate_configs(ctx: Context, args: GenerateConfigsArgs) -> miette::Result<()> {
    let feed = HttpFeed::new().into_diagnostic()?;
    let backend = DriverkitBackend::new(HttpFeed::new().into_diagnostic()?);
    let opts = GenerateOptions::new(ctx.options, args.auto);

    let count = generate(&opts, &feed, &backend).into_diagnostic()?;

    let verb = if opts.options.dry_run {
        "Would write"
    } else {
        "Wrote"
    };
    println_pad!(
        "{} {} config(s) for {}",
        verb.bright_green().bold(),
        count.to_string().bright_white().bold(),
        opts.options.architecture.non_deb().bright_cyan()
    );
    Ok(())
}
