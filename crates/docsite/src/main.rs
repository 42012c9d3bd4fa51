//! docsite CLI - static documentation site generator.
//!
//! Provides commands for:
//! - `clean`: Empty the output directory
//! - `build`: Generate the site from the source directory
//! - `serve`: Build, then serve the output locally until Ctrl-C

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CleanArgs, ServeArgs};
use error::CliError;
use output::Output;

/// docsite - static documentation site generator.
#[derive(Parser)]
#[command(name = "docsite", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove and recreate the output directory.
    Clean(CleanArgs),
    /// Generate the site.
    Build(BuildArgs),
    /// Generate the site and serve it locally.
    Serve(ServeArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Clean(args) => args.project.verbose,
            Self::Build(args) => args.project.verbose,
            Self::Serve(args) => args.project.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(cli.command) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        match command {
            Commands::Clean(args) => args.execute().await,
            Commands::Build(args) => args.execute().await,
            Commands::Serve(args) => args.execute().await,
        }
    });
    // Unfinished diagram fetches must not keep the process alive.
    rt.shutdown_background();
    result
}
