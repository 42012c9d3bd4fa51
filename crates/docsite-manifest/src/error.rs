//! Manifest error types.

use std::path::PathBuf;

/// Manifest-level failure. Aborts the build.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Invalid configuration - no title")]
    NoTitle,

    #[error("Invalid configuration - no contents")]
    NoContents,

    #[error("Invalid configuration - no valid contents")]
    NoValidContents,

    #[error("Invalid configuration - malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single content item that was dropped from the tree.
#[derive(Debug, thiserror::Error)]
pub enum ContentItemError {
    #[error("Invalid content item - no caption specified")]
    NoCaption,

    #[error("Invalid content item '{caption}' - no path specified")]
    NoPath { caption: String },

    #[error("Invalid content item - {0}")]
    Malformed(#[source] serde_json::Error),
}

/// A single download entry that was dropped.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Invalid download - 'target' not specified")]
    MissingTarget,

    #[error("Invalid download - 'target' invalid. File '{}' not found", path.display())]
    NotFound { path: PathBuf },

    #[error(
        "Invalid download - 'target' invalid. File '{}' is outside the source directory",
        path.display()
    )]
    OutsideSource { path: PathBuf },

    #[error("Invalid download - {0}")]
    Malformed(#[source] serde_json::Error),
}
