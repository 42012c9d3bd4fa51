//! Diagram rendering via Kroki.
//!
//! Diagram fences in markdown are replaced by image figures whose files are
//! fetched from a Kroki service into `<output>/diagrams/`:
//!
//! - [`DiagramKind`] / [`DiagramFormat`]: supported kinds and output formats
//! - [`DiagramKey`] / [`DiagramCache`]: `diag-<sha1(kind + target)>.<format>` naming
//! - [`DiagramFetcher`]: streaming POST to Kroki, detached or inline
//! - [`DiagramProcessor`]: the [`CodeBlockProcessor`](docsite_renderer::CodeBlockProcessor)
//!   registered on the markdown renderer
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use docsite_diagrams::{DiagramCache, DiagramFetcher, DiagramProcessor, FetchMode};
//! use docsite_renderer::MarkdownRenderer;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let fetcher = Arc::new(DiagramFetcher::new(
//!     "https://kroki.io",
//!     DiagramCache::new(Path::new("build/docsite")),
//!     FetchMode::Detached(runtime.handle().clone()),
//! ));
//! let mut renderer =
//!     MarkdownRenderer::new().with_processor(DiagramProcessor::new(Arc::clone(&fetcher)));
//!
//! let result = renderer.render("```mermaid flow\ngraph TD; A-->B\n```\n", "");
//! assert!(result.html.contains("<img"));
//!
//! let summary = runtime.block_on(fetcher.wait_all());
//! println!("{} fetched, {} failed", summary.completed, summary.failed);
//! ```

mod cache;
mod consts;
mod fetcher;
mod language;
mod processor;

pub use cache::{DiagramCache, DiagramKey};
pub use consts::{DEFAULT_FORMAT_ATTRIBUTE, DIAGRAMS_DIR};
pub use fetcher::{DiagramFetcher, FetchError, FetchMode, FetchRequest, FetchSummary};
pub use language::{DiagramFormat, DiagramKind};
pub use processor::{DiagramError, DiagramProcessor};
