//! Build error types.

use std::path::PathBuf;

use docsite_manifest::ManifestError;

use crate::builder::BuildStage;

/// Fatal build failure. Files written before the failure stay on disk.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("{stage}: failed to access {}: {source}", path.display())]
    Io {
        stage: BuildStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to clean {}: it contains the source directory", path.display())]
    OutputContainsSource { path: PathBuf },
}
