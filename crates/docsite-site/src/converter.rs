//! Markdown document conversion with diagram support.

use std::path::Path;
use std::sync::Arc;

use docsite_diagrams::{DiagramFetcher, DiagramProcessor};
use docsite_renderer::{MarkdownRenderer, root_prefix};

/// Converts markdown documents to HTML fragments.
///
/// Owns one renderer with a [`DiagramProcessor`] registered, reused for every
/// document of a build.
pub struct DocumentConverter {
    renderer: MarkdownRenderer,
}

impl DocumentConverter {
    #[must_use]
    pub fn new(fetcher: Arc<DiagramFetcher>) -> Self {
        Self {
            renderer: MarkdownRenderer::new().with_processor(DiagramProcessor::new(fetcher)),
        }
    }

    /// Convert one document.
    ///
    /// `relative_path` is the document's path below the source root; it decides
    /// how the document reaches shared output (`diagrams/`) and labels warnings.
    pub fn convert(&mut self, markdown: &str, relative_path: &Path) -> String {
        let root = root_prefix(relative_path.parent().unwrap_or(Path::new("")));
        let result = self.renderer.render(markdown, &root);
        for warning in &result.warnings {
            tracing::warn!(document = %relative_path.display(), "{warning}");
        }
        result.html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsite_diagrams::{DiagramCache, FetchMode};
    use tempfile::TempDir;

    #[test]
    fn test_convert_nested_document() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let out = TempDir::new().unwrap();
        let fetcher = Arc::new(DiagramFetcher::new(
            "http://127.0.0.1:1",
            DiagramCache::new(out.path()),
            FetchMode::Detached(rt.handle().clone()),
        ));
        let mut converter = DocumentConverter::new(Arc::clone(&fetcher));

        let html = converter.convert(
            "# Setup\n\nSee [intro](../intro.md).\n\n```mermaid diagA\ngraph TD\n```\n",
            Path::new("guide/setup.md"),
        );
        assert!(html.contains("<h1>Setup</h1>"));
        assert!(html.contains(r#"href="../intro.html""#));
        assert!(html.contains(r#"src="../diagrams/diag-"#));

        let html = converter.convert("```mermaid diagB\ngraph TD\n```\n", Path::new("index.md"));
        assert!(html.contains(r#"src="diagrams/diag-"#));

        rt.block_on(fetcher.wait_all());
    }
}
