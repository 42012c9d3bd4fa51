//! `docsite clean` command implementation.

use clap::Args;
use docsite_config::CliSettings;
use docsite_site::SiteBuilder;
use tokio::runtime::Handle;

use super::ProjectArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the clean command.
#[derive(Args)]
pub(crate) struct CleanArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

impl CleanArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.project.load_config(CliSettings::default())?;
        let builder = SiteBuilder::from_config(&config, Handle::current());

        builder.clean()?;
        output.success(&format!("Cleaned {}", builder.output_dir().display()));
        Ok(())
    }
}
