//! Diagram naming and per-build request tracking.
//!
//! Rendered diagrams are addressed by [`DiagramKey`]: the SHA-1 of the diagram
//! kind followed by its target. The diagram source is not part of the key, so
//! two blocks of the same kind and target share one file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use sha1::{Digest, Sha1};

use crate::consts::DIAGRAMS_DIR;
use crate::language::{DiagramFormat, DiagramKind};

/// Identity of a rendered diagram.
#[derive(Debug, Clone, Copy)]
pub struct DiagramKey<'a> {
    pub kind: DiagramKind,
    /// Caller-supplied disambiguator, if any.
    pub target: Option<&'a str>,
}

impl DiagramKey<'_> {
    /// Lowercase hex SHA-1 of `"{kind}{target}"`.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.kind.name().as_bytes());
        hasher.update(self.target.unwrap_or_default().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// File name for this diagram in `format`: `diag-<digest>.<format>`.
    #[must_use]
    pub fn file_name(&self, format: DiagramFormat) -> String {
        format!("diag-{}.{}", self.digest(), format.as_str())
    }
}

/// The `diagrams/` directory of one build.
#[derive(Debug)]
pub struct DiagramCache {
    dir: PathBuf,
    requested: Mutex<HashSet<String>>,
}

impl DiagramCache {
    /// Cache rooted at `<output_dir>/diagrams`.
    #[must_use]
    pub fn new(output_dir: &Path) -> Self {
        Self {
            dir: output_dir.join(DIAGRAMS_DIR),
            requested: Mutex::new(HashSet::new()),
        }
    }

    /// Directory holding rendered diagrams.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute destination of a diagram file.
    #[must_use]
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Record a request for `file_name`.
    ///
    /// Returns `false` when the name was already requested during this build.
    pub fn claim(&self, file_name: &str) -> bool {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_name.to_owned())
    }

    /// Forget a request so a later block may try again.
    pub fn release(&self, file_name: &str) {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(file_name);
    }
}
