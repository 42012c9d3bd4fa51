//! `docsite serve` command implementation.

use clap::Args;
use docsite_config::CliSettings;
use docsite_server::PreviewServer;

use super::build::{finish_diagrams, join_limit, run_build};
use super::{DiagramArgs, ProjectArgs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    diagrams: DiagramArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// First port to try (overrides config).
    #[arg(short, long)]
    port: Option<u16>,
}

impl ServeArgs {
    /// Build the site, serve it, and stop on Ctrl-C.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.project.load_config(CliSettings {
            host: self.host.clone(),
            port: self.port,
            ..self.diagrams.settings()
        })?;

        let report = run_build(&config, &output).await?;
        let server = PreviewServer::from_config(&config.server, &report.output_dir)
            .start()
            .await?;
        output.highlight(&format!("Serving {} at {}", report.title, server.url()));
        output.info("Press Ctrl-C to stop");

        let limit = join_limit(&config);
        let diagrams = tokio::spawn(async move {
            finish_diagrams(&report, &Output::new(), limit).await;
        });

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown signal received, stopping server...");
        diagrams.abort();
        server.stop().await?;
        Ok(())
    }
}
