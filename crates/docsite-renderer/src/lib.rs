//! Markdown to HTML renderer with pluggable code block processors.
//!
//! [`MarkdownRenderer`] turns one markdown document into an HTML fragment.
//! Fenced code blocks are offered to registered [`CodeBlockProcessor`]s in
//! registration order; the first one returning [`ProcessResult::Inline`]
//! replaces the block, otherwise the block renders as a regular listing.
//!
//! Relative links to `.md` documents are rewritten to their `.html` output,
//! and a leading YAML front-matter block supplies document attributes that
//! processors can read through [`DocumentContext`].
//!
//! # Example
//!
//! ```
//! use docsite_renderer::MarkdownRenderer;
//!
//! let mut renderer = MarkdownRenderer::new();
//! let result = renderer.render("# Hello\n\nSee [setup](setup.md).", "");
//! assert!(result.html.contains(r#"href="setup.html""#));
//! ```

mod code_block;
mod renderer;
mod util;

pub use code_block::{CodeBlockProcessor, DocumentContext, FencedBlock, ProcessResult};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use util::{
    OUTPUT_EXTENSION, SOURCE_EXTENSION, document_link, document_output_path, escape_html,
    is_source_document, root_prefix,
};
