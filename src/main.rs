//! `profview` command-line entry point.

mod cli_logger;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

use cli_logger::CliLogger;
use profview::{
    Config, DemoArgs, ProfviewError, ViewCommand, demo_command, schema_doc, show_command,
    view_command,
};

const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

/// Explore profiler output: filter, sort and chart per-section timings.
#[derive(Debug, Parser)]
#[command(name = "profview", author, version, about)]
struct Cli {
    /// Print machine-readable JSON instead of the pretty rendering.
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    no_color: bool,

    /// Config file; a missing file means defaults.
    #[arg(long, global = true, default_value = "profview.toml")]
    config: PathBuf,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    View(ViewCommand),
    /// Describe the profiler input format.
    Schema,
    /// Profile a sample trig workload and write its report.
    Demo(DemoArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let logger = CliLogger::new(cli.json, cli.no_color);
    if let Err(err) = run(&cli, &logger) {
        logger.print_error(&format!("{err:#}"));
        std::process::exit(exit_code_for(&err));
    }
}

fn run(cli: &Cli, logger: &CliLogger) -> Result<()> {
    let config = Config::load_optional(&cli.config);
    tracing::debug!(?config, "loaded config");

    match &cli.command {
        Command::View(ViewCommand::Show { file, limit, view }) => {
            logger.print_show(&show_command(&config, file, *limit, view)?)
        }
        Command::View(cmd @ ViewCommand::Chart { out: None, .. }) => {
            logger.print_document(&view_command(&config, cmd)?, "svg")
        }
        Command::View(cmd) => logger.print_serialized(&view_command(&config, cmd)?),
        Command::Schema => logger.print_serialized(&schema_doc()),
        Command::Demo(args) => logger.print_serialized(&demo_command(&config, args)?),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,profview={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ProfviewError>() {
        Some(ProfviewError::InvalidArgument(_)) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}
