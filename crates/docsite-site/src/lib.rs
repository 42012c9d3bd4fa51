//! Static site generation for docsite.
//!
//! [`SiteBuilder`] turns a source directory holding a `docsite.config.json`
//! manifest into a browsable site: the site shell, every markdown document
//! converted to an HTML fragment, every other file copied as-is, the
//! normalized manifest and the site icon.
//!
//! ```no_run
//! use docsite_site::SiteBuilder;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let builder = SiteBuilder::new("docs", "docs/build/docsite", runtime.handle().clone());
//! let report = builder.build().unwrap();
//! runtime.block_on(report.wait_for_diagrams());
//! ```

mod builder;
mod converter;
mod error;
mod shell;

pub use builder::{BuildReport, BuildStage, DiagramSettings, SiteBuilder};
pub use converter::DocumentConverter;
pub use docsite_diagrams::FetchSummary;
pub use error::BuildError;
pub use shell::{FAVICON, LANDING_PAGE, ShellFile, SiteShell, TITLE_PLACEHOLDER};
