//! Code block processor turning diagram fences into image figures.
//!
//! # Example
//!
//! ````markdown
//! ```mermaid login png title="Login flow"
//! sequenceDiagram
//!     Browser->>Server: POST /login
//! ```
//! ````
//!
//! Positional arguments are `target` then `format`; both may also be given as
//! `target=` / `format=`. The format falls back to the `kroki-default-format`
//! document attribute, then to `svg`.

use std::sync::Arc;

use docsite_renderer::{
    CodeBlockProcessor, DocumentContext, FencedBlock, ProcessResult, escape_html,
};

use crate::cache::DiagramKey;
use crate::consts::{DEFAULT_FORMAT_ATTRIBUTE, DIAGRAMS_DIR};
use crate::fetcher::{DiagramFetcher, FetchError, FetchRequest};
use crate::language::{DiagramFormat, DiagramKind};

/// Failure processing one diagram block.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("Unsupported diagram format '{0}'")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Replaces diagram fences with `<figure>` image references.
///
/// The image is requested through the shared [`DiagramFetcher`]; the figure is
/// emitted right away and points at the file the fetch is filling. Blocks that
/// fail degrade to a listing with the `kroki-error` class and leave a warning
/// for the renderer's caller to report.
pub struct DiagramProcessor {
    fetcher: Arc<DiagramFetcher>,
    figure_number: usize,
    warnings: Vec<String>,
}

impl DiagramProcessor {
    #[must_use]
    pub fn new(fetcher: Arc<DiagramFetcher>) -> Self {
        Self {
            fetcher,
            figure_number: 0,
            warnings: Vec::new(),
        }
    }

    fn render(
        &mut self,
        kind: DiagramKind,
        block: &FencedBlock<'_>,
        document: &DocumentContext,
    ) -> Result<String, DiagramError> {
        let format_name = block
            .attr("format")
            .or_else(|| block.positional(1))
            .or_else(|| document.attribute(DEFAULT_FORMAT_ATTRIBUTE))
            .unwrap_or(DiagramFormat::default().as_str());
        let format = DiagramFormat::parse(format_name)
            .ok_or_else(|| DiagramError::UnsupportedFormat(format_name.to_owned()))?;

        let target = block.attr("target").or_else(|| block.positional(0));
        let title = block.attr("title");
        let alt = title.or(target).unwrap_or("Diagram");
        let role = match block.attr("role") {
            Some(role) => format!("{role} kroki-format-{} kroki", format.as_str()),
            None => "kroki".to_owned(),
        };

        let file_name = DiagramKey { kind, target }.file_name(format);
        self.fetcher.fetch(&FetchRequest {
            kind,
            format,
            source: block.source,
            file_name: &file_name,
        })?;

        let id = block
            .attr("id")
            .map(|id| format!(r#" id="{}""#, escape_html(id)))
            .unwrap_or_default();
        let caption = title
            .map(|title| {
                let label = match block.attr("caption") {
                    Some(caption) => caption.to_owned(),
                    None => {
                        self.figure_number += 1;
                        format!("Figure {}. ", self.figure_number)
                    }
                };
                format!(
                    "<figcaption>{}{}</figcaption>",
                    escape_html(&label),
                    escape_html(title)
                )
            })
            .unwrap_or_default();

        Ok(format!(
            r#"<figure{id} class="diagram {role}"><img src="{root}{DIAGRAMS_DIR}/{file_name}" alt="{alt}">{caption}</figure>"#,
            role = escape_html(&role),
            root = document.root(),
            alt = escape_html(alt),
        ))
    }
}

/// Listing shown in place of a diagram that could not be processed.
fn error_block(block: &FencedBlock<'_>) -> String {
    let class = match block.attr("role") {
        Some(role) => format!("{} kroki-error", escape_html(role)),
        None => "kroki-error".to_owned(),
    };
    format!(
        r#"<pre class="{class}"><code class="language-{}">{}</code></pre>"#,
        escape_html(block.language),
        escape_html(block.source)
    )
}

impl CodeBlockProcessor for DiagramProcessor {
    fn begin_document(&mut self) {
        self.figure_number = 0;
    }

    fn process(&mut self, block: &FencedBlock<'_>, document: &DocumentContext) -> ProcessResult {
        let Some(kind) = DiagramKind::parse(block.language) else {
            return ProcessResult::PassThrough;
        };

        match self.render(kind, block, document) {
            Ok(html) => ProcessResult::Inline(html),
            Err(e) => {
                self.warnings
                    .push(format!("Skipping {} block. {e}", block.language));
                ProcessResult::Inline(error_block(block))
            }
        }
    }

    fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}
