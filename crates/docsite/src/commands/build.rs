//! `docsite build` command implementation.

use std::time::Duration;

use clap::Args;
use docsite_config::Config;
use docsite_site::{BuildReport, FetchSummary, SiteBuilder};
use tokio::runtime::Handle;

use super::{DiagramArgs, ProjectArgs};
use crate::error::CliError;
use crate::output::Output;

/// How long to wait for diagram fetches when no request timeout is configured.
const DEFAULT_JOIN_LIMIT: Duration = Duration::from_secs(30);

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    diagrams: DiagramArgs,
}

impl BuildArgs {
    /// Build the site, then give diagram fetches a bounded time to finish.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.project.load_config(self.diagrams.settings())?;

        let report = run_build(&config, &output).await?;
        finish_diagrams(&report, &output, join_limit(&config)).await;
        Ok(())
    }
}

/// Run a full build on a blocking thread and report success.
pub(crate) async fn run_build(config: &Config, output: &Output) -> Result<BuildReport, CliError> {
    output.info(&format!(
        "Source: {}",
        config.docs_resolved.source_dir.display()
    ));
    output.info(&format!(
        "Output: {}",
        config.docs_resolved.output_dir.display()
    ));
    output.info(&format!(
        "Kroki URL: {}",
        config.diagrams_resolved.service_url()
    ));

    let builder = SiteBuilder::from_config(config, Handle::current());
    let report = tokio::task::spawn_blocking(move || builder.build()).await??;

    output.success(&format!(
        "Site generated to {} ({} documents, {} files copied)",
        report.output_dir.display(),
        report.documents,
        report.copied
    ));
    Ok(report)
}

/// Upper bound on joining diagram fetches after a build.
pub(crate) fn join_limit(config: &Config) -> Duration {
    config.diagrams_resolved.timeout.unwrap_or(DEFAULT_JOIN_LIMIT)
}

/// Wait up to `limit` for outstanding diagram fetches and print the outcome.
///
/// Returns `None` when fetches were still running at the deadline.
pub(crate) async fn finish_diagrams(
    report: &BuildReport,
    output: &Output,
    limit: Duration,
) -> Option<FetchSummary> {
    let pending = report.pending_diagrams();
    if pending > 0 {
        output.info(&format!("Waiting for {pending} diagram(s)..."));
    }

    let Ok(summary) = tokio::time::timeout(limit, report.wait_for_diagrams()).await else {
        output.warning(&format!(
            "{} diagram(s) still downloading after {}s, not waiting any longer",
            report.pending_diagrams(),
            limit.as_secs()
        ));
        return None;
    };

    if summary.failed > 0 {
        output.warning(&format!(
            "{} of {} diagram(s) failed to render",
            summary.failed,
            summary.failed + summary.completed
        ));
    } else if summary.completed > 0 {
        output.info(&format!("{} diagram(s) rendered", summary.completed));
    }
    Some(summary)
}
