use colored::Colorize;
use dbg_core::Stats;
use miette::IntoDiagnostic;

use super::Context;
use crate::println_pad;
use crate::utils::render_table;

pub fn stats_configs(ctx: Context) -> miette::Result<()> {
    let stats = dbg_core::config_stats(&ctx.options).into_diagnostic()?;
    print_stats(&stats, true);
    Ok(())
}

pub fn stats_drivers(ctx: Context, bucket: Option<String>) -> miette::Result<()> {
    let store = ctx.bucket(bucket.as_deref())?;
    let stats = dbg_core::driver_stats(&ctx.options, &store).into_diagnostic()?;
    print_stats(&stats, false);
    Ok(())
}

fn print_stats(stats: &Stats, with_config_columns: bool) {
    let mut header = vec![
        "Version".bright_yellow().bold().to_string(),
        "Modules".bright_yellow().bold().to_string(),
        "Probes".bright_yellow().bold().to_string(),
    ];
    if with_config_columns {
        header.push("Headers".bright_yellow().bold().to_string());
        header.push("KernelConfigData".bright_yellow().bold().to_string());
    }

    let row = |name: String, s: &dbg_core::DriverStats| {
        let mut cells = vec![name, s.num_modules.to_string(), s.num_probes.to_string()];
        if with_config_columns {
            cells.push(s.num_headers.to_string());
            cells.push(s.num_config_data.to_string());
        }
        cells
    };

    let mut rows: Vec<Vec<String>> = stats
        .entries
        .iter()
        .map(|(dv, s)| row(dv.bright_cyan().to_string(), s))
        .collect();
    rows.push(row(
        "TOTALS".bright_green().bold().to_string(),
        &stats.totals(),
    ));

    for line in render_table(&header, &rows) {
        println_pad!("{}", line);
    }
}
