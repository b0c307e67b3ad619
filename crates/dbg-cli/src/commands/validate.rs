use colored::Colorize;
use miette::IntoDiagnostic;

use super::Context;
use crate::println_pad;

pub fn validate_configs(ctx: Context) -> miette::Result<()> {
    let validated = dbg_core::validate(&ctx.options).into_diagnostic()?;
    println_pad!(
        "{} {} config(s) are consistent",
        "✔".bright_green().bold(),
        validated.to_string().bright_white().bold()
    );
    Ok(())
}
