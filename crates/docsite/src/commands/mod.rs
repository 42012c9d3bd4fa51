//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod clean;
pub(crate) mod serve;

use std::path::PathBuf;

use clap::Args;
use docsite_config::{CliSettings, Config, ConfigError};

pub(crate) use build::BuildArgs;
pub(crate) use clean::CleanArgs;
pub(crate) use serve::ServeArgs;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct ProjectArgs {
    /// Path to configuration file (default: auto-discover docsite.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Documentation source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Build output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose output (show build stages and diagram warnings).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ProjectArgs {
    /// Load configuration with these arguments applied on top of `settings`.
    pub(crate) fn load_config(&self, settings: CliSettings) -> Result<Config, ConfigError> {
        let settings = CliSettings {
            source_dir: self.source_dir.clone(),
            output_dir: self.output_dir.clone(),
            ..settings
        };
        Config::load(self.config.as_deref(), Some(&settings))
    }
}

/// Diagram rendering options.
#[derive(Args)]
pub(crate) struct DiagramArgs {
    /// Kroki server URL or host for diagram rendering (overrides config).
    #[arg(long, env = "DOCSITE_KROKI_URL")]
    kroki_url: Option<String>,

    /// Fetch every diagram before its document is written.
    #[arg(long)]
    wait_for_diagrams: bool,
}

impl DiagramArgs {
    pub(crate) fn settings(&self) -> CliSettings {
        CliSettings {
            kroki_url: self.kroki_url.clone(),
            wait_for_diagrams: self.wait_for_diagrams.then_some(true),
            ..CliSettings::default()
        }
    }
}
