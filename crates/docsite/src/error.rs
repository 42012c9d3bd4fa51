//! CLI error types.

use docsite_config::ConfigError;
use docsite_server::ServerError;
use docsite_site::BuildError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
