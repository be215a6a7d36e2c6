//! The command-line interface for the kiln incremental C/C++ builder.
//!
//! Provides `kiln build` to compile, link and copy resources, `kiln clean` to
//! remove build outputs, and `kiln config` to print the resolved project
//! configuration.

#![warn(missing_docs)]

mod build;
mod clean;
mod pipeline;
mod summary;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Kiln: incremental builds for C and C++ projects.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Incremental C/C++ build tool")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `kiln.toml` (or `kiln.yaml`) configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile stale sources, link, and synchronize resources.
    Build(BuildArgs),
    /// Remove the object directory and the executable.
    Clean,
    /// Print the resolved project configuration.
    Config,
}

/// Arguments for the `kiln build` subcommand.
#[derive(Parser, Debug, Default)]
pub struct BuildArgs {
    /// Compile only; do not link the executable.
    #[arg(long)]
    pub skip_link: bool,

    /// Write `compile_commands.json` even if the configuration does not ask for it.
    #[arg(long)]
    pub compile_commands: bool,

    /// Do not synchronize resources.
    #[arg(long)]
    pub no_resources: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("NO_COLOR").is_none() && std::env::var("TERM").is_ok(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    init_logging(&global);

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Clean => clean::run(&global),
        Command::Config => summary::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `KILN_LOG` overrides the flag-derived level.
fn init_logging(global: &GlobalArgs) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("KILN_LOG")
                .unwrap_or_else(|_| EnvFilter::new(default_log_level(global))),
        )
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .without_time()
        .init();
}

fn default_log_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Prints a right-aligned status line in the style of `   Compiling src/main.cpp`.
pub(crate) fn status(global: &GlobalArgs, verb: &str, message: impl std::fmt::Display) {
    if !global.quiet {
        eprintln!("{verb:>12} {message}");
    }
}
