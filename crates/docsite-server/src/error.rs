//! Error types for the preview server.

use std::io;

/// Preview server error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding failed for a reason other than the port being taken.
    #[error("Failed to bind {host}:{port}: {source}")]
    Bind {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Every port in the retry range was taken.
    #[error("No free port on {host} in {first}..={last}")]
    PortsExhausted { host: String, first: u16, last: u16 },

    /// The serving task panicked or was cancelled.
    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
