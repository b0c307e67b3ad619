use colored::Colorize;
use miette::IntoDiagnostic;

use super::Context;
use crate::println_pad;

pub fn cleanup_configs(ctx: Context) -> miette::Result<()> {
    let removed = dbg_core::cleanup_configs(&ctx.options).into_diagnostic()?;
    println_pad!(
        "{} {} config entr{}",
        "Removed".bright_green().bold(),
        removed,
        if removed == 1 { "y" } else { "ies" }
    );
    Ok(())
}

pub fn cleanup_drivers(ctx: Context, bucket: Option<String>) -> miette::Result<()> {
    let store = ctx.bucket(bucket.as_deref())?;
    let removed = dbg_core::cleanup_drivers(&ctx.options, &store).into_diagnostic()?;
    println_pad!(
        "{} {} driver(s) from {}",
        "Deleted".bright_green().bold(),
        removed,
        store.root().as_str().bright_cyan()
    );
    Ok(())
}
