use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    build_configs, cleanup_configs, cleanup_drivers, generate_configs, publish_drivers,
    stats_configs, stats_drivers, validate_configs, BuildConfigsArgs, Context,
    GenerateConfigsArgs, GlobalArgs,
};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod backend;
mod commands;
mod errors;
mod feed;
mod utils;

#[derive(Parser, Debug)]
#[command(name = "dbg", version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work with driver build configs
    Configs {
        #[command(subcommand)]
        command: ConfigsCommands,
    },
    /// Work with published drivers
    Drivers {
        #[command(subcommand)]
        command: DriversCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigsCommands {
    /// Generate configs from the kernel crawler feed or for a single target
    Generate {
        /// Generate for every kernel the crawler knows about
        #[arg(long, env = "DBG_AUTO")]
        auto: bool,
    },
    /// Build drivers from configs
    Build {
        /// Directory used as object store
        #[arg(long, env = "DBG_BUCKET")]
        bucket: Option<String>,

        /// Skip configs whose drivers are already published
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        skip_existing: bool,

        /// Keep building when a driver fails
        #[arg(long)]
        ignore_errors: bool,

        /// Append build failures to this file
        #[arg(long)]
        redirect_errors: Option<String>,

        /// Publish drivers once built
        #[arg(long)]
        publish: bool,
    },
    /// Remove configs
    Cleanup,
    /// Count configs per driver version
    Stats,
    /// Check configs for consistency
    Validate,
}

#[derive(Subcommand, Debug)]
pub enum DriversCommands {
    /// Delete published drivers
    Cleanup {
        /// Directory used as object store
        #[arg(long, env = "DBG_BUCKET")]
        bucket: Option<String>,
    },
    /// Count published drivers per driver version
    Stats {
        /// Directory used as object store
        #[arg(long, env = "DBG_BUCKET")]
        bucket: Option<String>,
    },
    /// Upload locally built drivers
    Publish {
        /// Directory used as object store
        #[arg(long, env = "DBG_BUCKET")]
        bucket: Option<String>,
    },
}

fn command() -> clap::Command {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    Args::command()
        .mut_arg("target_distro", |arg| arg.long_help(target_distro_help()))
        .styles(styles)
        .color(ColorChoice::Auto)
}

fn parse_args() -> Args {
    let matches = command().get_matches();

    match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    }
}

fn target_distro_help() -> String {
    format!(
        "Target distro regex (feed or backend naming). \
         Use \"load\" with --auto to pick the distro crawled last.\n\n\
         Supported distros: {}",
        dbg_core::distro::supported_distros().join(", ")
    )
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.global.log_level.as_filter());

    let ctx = Context::resolve(&args.global)?;

    match args.command {
        Commands::Configs { command } => match command {
            ConfigsCommands::Generate { auto } => {
                generate_configs(ctx, GenerateConfigsArgs { auto })
            }
            ConfigsCommands::Build {
                bucket,
                skip_existing,
                ignore_errors,
                redirect_errors,
                publish,
            } => build_configs(
                ctx,
                BuildConfigsArgs {
                    bucket,
                    skip_existing,
                    ignore_errors,
                    redirect_errors,
                    publish,
                },
            ),
            ConfigsCommands::Cleanup => cleanup_configs(ctx),
            ConfigsCommands::Stats => stats_configs(ctx),
            ConfigsCommands::Validate => validate_configs(ctx),
        },
        Commands::Drivers { command } => match command {
            DriversCommands::Cleanup { bucket } => cleanup_drivers(ctx, bucket),
            DriversCommands::Stats { bucket } => stats_drivers(ctx, bucket),
            DriversCommands::Publish { bucket } => publish_drivers(ctx, bucket),
        },
    }
}
