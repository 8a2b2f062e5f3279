//! regsim CLI: batch runs, variable listings and an interactive session for
//! the reference designs.

#![warn(missing_docs)]

mod pipeline;
mod repl;
mod run;
mod signals;

use std::process;

use clap::{Parser, Subcommand};

/// regsim: region-scheduled simulation of small synchronous designs.
#[derive(Parser, Debug)]
#[command(name = "regsim", version, about = "Region-scheduled design simulator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `regsim.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the variables a design registers.
    Signals(SignalsArgs),
    /// Run a design for a number of cycles with configured stimulus.
    Run(RunArgs),
    /// Start an interactive poke/peek/tick session.
    Repl(ReplArgs),
}

/// Arguments for `regsim signals`.
#[derive(Parser, Debug)]
pub struct SignalsArgs {
    /// Design name.
    pub design: String,
}

/// Arguments for `regsim run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Design name (overrides `run.design`).
    #[arg(short, long)]
    pub design: Option<String>,

    /// Cycle count (overrides `run.cycles`).
    #[arg(short, long)]
    pub cycles: Option<u64>,

    /// Print the final snapshot as JSON instead of per-cycle watch lines.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `regsim repl`.
#[derive(Parser, Debug)]
pub struct ReplArgs {
    /// Design name.
    pub design: String,

    /// Clock input toggled by `tick` (inferred when omitted).
    #[arg(long)]
    pub clock: Option<String>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Signals(ref args) => signals::run(args, &global),
        Command::Run(ref args) => run::run(args, &global),
        Command::Repl(ref args) => repl::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Chooses the log level: flags first, then `RUST_LOG`, then `warn`.
fn log_level(quiet: bool, verbose: bool, env: Option<&str>) -> tracing::Level {
    if quiet {
        return tracing::Level::ERROR;
    }
    if verbose {
        return tracing::Level::DEBUG;
    }
    match env.map(str::to_lowercase).as_deref() {
        Some("error") => tracing::Level::ERROR,
        Some("info") => tracing::Level::INFO,
        Some("debug") => tracing::Level::DEBUG,
        Some("trace") => tracing::Level::TRACE,
        _ => tracing::Level::WARN,
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let env = std::env::var("RUST_LOG").ok();
    let level = log_level(quiet, verbose, env.as_deref());
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging unavailable: {e}");
    }
}
