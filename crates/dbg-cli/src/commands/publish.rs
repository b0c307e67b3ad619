use colored::Colorize;
use miette::IntoDiagnostic;

use super::Context;
use crate::println_pad;

pub fn publish_drivers(ctx: Context, bucket: Option<String>) -> miette::Result<()> {
    let store = ctx.bucket(bucket.as_deref())?;
    let published = dbg_core::publish(&ctx.options, &store).into_diagnostic()?;
    println_pad!(
        "{} {} driver(s) to {}",
        "Published".bright_green().bold(),
        published,
        store.root().as_str().bright_cyan()
    );
    Ok(())
}
