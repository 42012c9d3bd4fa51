//! Site build pipeline.
//!
//! A build always runs every stage in order, starting from an empty output
//! directory:
//!
//! ```text
//! Clean → ManifestLoaded → ShellCopied → ContentWalked → ManifestWritten → AssetsCopied → Done
//! ```
//!
//! Any error stops the build where it happened. Output written so far is left
//! in place.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docsite_config::{Config, DiagramsConfig};
use docsite_diagrams::{DiagramCache, DiagramFetcher, FetchMode, FetchSummary};
use docsite_manifest::{MANIFEST_FILENAME, SiteManifest};
use docsite_renderer::{OUTPUT_EXTENSION, is_source_document};
use tokio::runtime::Handle;

use crate::converter::DocumentConverter;
use crate::error::BuildError;
use crate::shell::{self, FAVICON, LANDING_PAGE, SiteShell};

/// Build pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Clean,
    ManifestLoaded,
    ShellCopied,
    ContentWalked,
    ManifestWritten,
    AssetsCopied,
    Done,
}

impl BuildStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::ManifestLoaded => "load manifest",
            Self::ShellCopied => "copy site shell",
            Self::ContentWalked => "process content",
            Self::ManifestWritten => "write manifest",
            Self::AssetsCopied => "copy assets",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn io_error(stage: BuildStage, path: &Path) -> impl FnOnce(io::Error) -> BuildError + use<> {
    let path = path.to_path_buf();
    move |source| BuildError::Io {
        stage,
        path,
        source,
    }
}

/// Diagram settings of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSettings {
    /// Kroki base URL, scheme included.
    pub service_url: String,
    /// Fetch each diagram before its document is written.
    pub wait: bool,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl Default for DiagramSettings {
    fn default() -> Self {
        Self::from(&DiagramsConfig::default())
    }
}

impl From<&DiagramsConfig> for DiagramSettings {
    fn from(config: &DiagramsConfig) -> Self {
        Self {
            service_url: config.service_url(),
            wait: config.wait,
            timeout: config.timeout,
        }
    }
}

/// Outcome of a successful build.
///
/// Detached diagram fetches may still be running; use
/// [`wait_for_diagrams`](Self::wait_for_diagrams) to join them.
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub title: String,
    /// Converted documents.
    pub documents: usize,
    /// Content files copied or templated as-is.
    pub copied: usize,
    diagrams: Arc<DiagramFetcher>,
}

impl fmt::Debug for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildReport")
            .field("output_dir", &self.output_dir)
            .field("title", &self.title)
            .field("documents", &self.documents)
            .field("copied", &self.copied)
            .field("pending_diagrams", &self.pending_diagrams())
            .finish()
    }
}

impl BuildReport {
    /// Diagram fetches not yet joined.
    #[must_use]
    pub fn pending_diagrams(&self) -> usize {
        self.diagrams.pending()
    }

    /// Wait until every diagram fetch of this build has finished.
    pub async fn wait_for_diagrams(&self) -> FetchSummary {
        self.diagrams.wait_all().await
    }
}

/// Mutable state of one build run.
struct BuildContext {
    title: String,
    output_dir: PathBuf,
    /// Canonical output path, skipped when it lies inside the source tree.
    output_canonical: Option<PathBuf>,
    converter: DocumentConverter,
    documents: usize,
    copied: usize,
}

impl BuildContext {
    /// Recursively transform `dir` into `<output>/<relative>`.
    fn walk(&mut self, dir: &Path, relative: &Path) -> Result<(), BuildError> {
        let stage = BuildStage::ContentWalked;
        let destination = self.output_dir.join(relative);
        fs::create_dir_all(&destination).map_err(io_error(stage, &destination))?;

        for entry in fs::read_dir(dir).map_err(io_error(stage, dir))? {
            let entry = entry.map_err(io_error(stage, dir))?;
            let path = entry.path();
            let relative = relative.join(entry.file_name());

            if path.is_dir() {
                if self.is_output_dir(&path) {
                    tracing::debug!(path = %path.display(), "Skipping output directory");
                    continue;
                }
                self.walk(&path, &relative)?;
            } else if path.is_file() {
                self.process_file(&path, &relative)?;
            }
        }
        Ok(())
    }

    fn is_output_dir(&self, path: &Path) -> bool {
        self.output_canonical
            .as_deref()
            .is_some_and(|output| path.canonicalize().is_ok_and(|p| p == output))
    }

    fn process_file(&mut self, path: &Path, relative: &Path) -> Result<(), BuildError> {
        let stage = BuildStage::ContentWalked;
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        tracing::debug!(file = %relative.display(), "Processing");

        if is_source_document(&name) {
            let bytes = fs::read(path).map_err(io_error(stage, path))?;
            let markdown = String::from_utf8_lossy(&bytes);
            if let Cow::Owned(_) = markdown {
                tracing::warn!(document = %relative.display(), "Document is not valid UTF-8");
            }
            let html = self.converter.convert(&markdown, relative);
            let destination = self.output_dir.join(relative.with_extension(OUTPUT_EXTENSION));
            fs::write(&destination, html).map_err(io_error(stage, &destination))?;
            self.documents += 1;
        } else if name == MANIFEST_FILENAME {
            // Written separately in normalized form.
        } else if name == LANDING_PAGE {
            let destination = self.output_dir.join(relative);
            let page = fs::read(path).map_err(io_error(stage, path))?;
            self.write_landing_page(&page, &destination, stage)?;
            self.copied += 1;
        } else {
            let destination = self.output_dir.join(relative);
            fs::copy(path, &destination).map_err(io_error(stage, &destination))?;
            self.copied += 1;
        }
        Ok(())
    }

    fn write_landing_page(
        &self,
        page: &[u8],
        destination: &Path,
        stage: BuildStage,
    ) -> Result<(), BuildError> {
        let page = shell::substitute_title(&String::from_utf8_lossy(page), &self.title);
        fs::write(destination, page).map_err(io_error(stage, destination))
    }
}

/// Builds a static site from a source directory.
pub struct SiteBuilder {
    source_dir: PathBuf,
    output_dir: PathBuf,
    shell: SiteShell,
    diagrams: DiagramSettings,
    runtime: Handle,
}

impl SiteBuilder {
    /// Create a builder. Detached diagram fetches run on `runtime`.
    #[must_use]
    pub fn new(
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        runtime: Handle,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            shell: SiteShell::default(),
            diagrams: DiagramSettings::default(),
            runtime,
        }
    }

    /// Create a builder from resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config, runtime: Handle) -> Self {
        let docs = &config.docs_resolved;
        let shell = docs
            .shell_dir
            .clone()
            .map_or(SiteShell::Embedded, SiteShell::Directory);
        Self::new(&docs.source_dir, &docs.output_dir, runtime)
            .with_shell(shell)
            .with_diagrams(DiagramSettings::from(&config.diagrams_resolved))
    }

    #[must_use]
    pub fn with_shell(mut self, shell: SiteShell) -> Self {
        self.shell = shell;
        self
    }

    #[must_use]
    pub fn with_diagrams(mut self, diagrams: DiagramSettings) -> Self {
        self.diagrams = diagrams;
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Remove the output directory and recreate it empty.
    pub fn clean(&self) -> Result<(), BuildError> {
        let stage = BuildStage::Clean;
        self.check_output_dir()?;

        match fs::remove_dir_all(&self.output_dir) {
            Ok(()) => tracing::info!(path = %self.output_dir.display(), "Cleaned output directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.output_dir.display(), "Creating output directory");
            }
            Err(e) => return Err(io_error(stage, &self.output_dir)(e)),
        }
        fs::create_dir_all(&self.output_dir).map_err(io_error(stage, &self.output_dir))
    }

    /// Run a full build.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        self.clean()?;

        let manifest = SiteManifest::load(&self.source_dir)?;
        tracing::info!(stage = %BuildStage::ManifestLoaded, title = %manifest.title);

        let fetcher = Arc::new(self.create_fetcher());
        let mut ctx = BuildContext {
            title: manifest.title.clone(),
            output_dir: self.output_dir.clone(),
            output_canonical: self.output_dir.canonicalize().ok(),
            converter: DocumentConverter::new(Arc::clone(&fetcher)),
            documents: 0,
            copied: 0,
        };

        self.copy_shell(&ctx)?;
        tracing::info!(stage = %BuildStage::ShellCopied);

        ctx.walk(&self.source_dir, Path::new(""))?;
        tracing::info!(
            stage = %BuildStage::ContentWalked,
            documents = ctx.documents,
            copied = ctx.copied
        );

        manifest.write(&self.output_dir)?;
        tracing::info!(stage = %BuildStage::ManifestWritten);

        self.copy_assets()?;
        tracing::info!(stage = %BuildStage::AssetsCopied);

        tracing::info!(
            stage = %BuildStage::Done,
            pending_diagrams = fetcher.pending(),
            "Site generated to {}",
            self.output_dir.display()
        );
        Ok(BuildReport {
            output_dir: self.output_dir.clone(),
            title: manifest.title,
            documents: ctx.documents,
            copied: ctx.copied,
            diagrams: fetcher,
        })
    }

    /// Refuse to delete a directory holding the sources.
    fn check_output_dir(&self) -> Result<(), BuildError> {
        let (Ok(source), Ok(output)) = (
            self.source_dir.canonicalize(),
            self.output_dir.canonicalize(),
        ) else {
            return Ok(());
        };
        if source.starts_with(&output) {
            return Err(BuildError::OutputContainsSource {
                path: self.output_dir.clone(),
            });
        }
        Ok(())
    }

    fn create_fetcher(&self) -> DiagramFetcher {
        let mode = if self.diagrams.wait {
            FetchMode::Inline
        } else {
            FetchMode::Detached(self.runtime.clone())
        };
        DiagramFetcher::new(
            self.diagrams.service_url.clone(),
            DiagramCache::new(&self.output_dir),
            mode,
        )
        .with_timeout(self.diagrams.timeout)
    }

    fn copy_shell(&self, ctx: &BuildContext) -> Result<(), BuildError> {
        let stage = BuildStage::ShellCopied;
        let files = match &self.shell {
            SiteShell::Directory(dir) => self.shell.files().map_err(io_error(stage, dir))?,
            SiteShell::Embedded => self.shell.files().map_err(io_error(stage, Path::new("")))?,
        };

        for file in files {
            let destination = self.output_dir.join(&file.path);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(io_error(stage, parent))?;
            }
            if file.path.file_name().is_some_and(|n| n == LANDING_PAGE) {
                ctx.write_landing_page(&file.data, &destination, stage)?;
            } else {
                fs::write(&destination, &file.data).map_err(io_error(stage, &destination))?;
            }
        }
        Ok(())
    }

    fn copy_assets(&self) -> Result<(), BuildError> {
        let destination = self.output_dir.join(FAVICON);
        if destination.exists() {
            tracing::debug!("Keeping existing {FAVICON}");
            return Ok(());
        }
        if let Some(icon) = shell::favicon() {
            fs::write(&destination, icon)
                .map_err(io_error(BuildStage::AssetsCopied, &destination))?;
        }
        Ok(())
    }
}
