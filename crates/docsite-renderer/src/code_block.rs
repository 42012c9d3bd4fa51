//! Code block processor trait for extensible fenced block handling.
//!
//! Processors are registered once on a [`MarkdownRenderer`](crate::MarkdownRenderer)
//! and consulted for every fenced code block of every document it renders.
//!
//! # Fence info syntax
//!
//! ```text
//! name [positional ...] [key=value ...]
//! ```
//!
//! Arguments are separated by whitespace or commas. Values may be wrapped in
//! single or double quotes to include separators (`title="Login flow"`).
//!
//! # Example
//!
//! ```
//! use docsite_renderer::{CodeBlockProcessor, DocumentContext, FencedBlock, ProcessResult};
//!
//! struct Shout;
//!
//! impl CodeBlockProcessor for Shout {
//!     fn process(&mut self, block: &FencedBlock<'_>, _doc: &DocumentContext) -> ProcessResult {
//!         if block.language == "shout" {
//!             ProcessResult::Inline(format!("<p>{}</p>", block.source.to_uppercase()))
//!         } else {
//!             ProcessResult::PassThrough
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace the code block with this HTML.
    Inline(String),
    /// Not handled; render as a regular code block.
    PassThrough,
}

/// A fenced code block as seen by processors.
#[derive(Debug)]
pub struct FencedBlock<'a> {
    /// Block name (first word of the fence info string).
    pub language: &'a str,
    /// `key=value` arguments from the fence info string.
    pub attrs: &'a HashMap<String, String>,
    /// Positional arguments following the name, in order.
    pub positional: &'a [String],
    /// Literal block body.
    pub source: &'a str,
    /// Zero-based index of this fenced block within the document.
    pub index: usize,
}

impl FencedBlock<'_> {
    /// Look up a named attribute, ignoring empty values.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Positional argument at `position`, ignoring empty values.
    #[must_use]
    pub fn positional(&self, position: usize) -> Option<&str> {
        self.positional
            .get(position)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Per-document information available to processors.
#[derive(Debug, Default, Clone)]
pub struct DocumentContext {
    attributes: HashMap<String, String>,
    root: String,
}

impl DocumentContext {
    /// Create a context for a document whose output root is reached via `root`
    /// (e.g. `"../"` for a document one directory deep).
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            attributes: HashMap::new(),
            root: root.into(),
        }
    }

    /// Add a document attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Document-level attribute from front matter.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Relative prefix from the document to the output root.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    pub(crate) fn extend_attributes(&mut self, attributes: impl IntoIterator<Item = (String, String)>) {
        self.attributes.extend(attributes);
    }

    pub(crate) fn into_attributes(self) -> HashMap<String, String> {
        self.attributes
    }
}

/// Handler for fenced code blocks.
///
/// This is the only registration contract of the renderer: implement it and
/// pass the processor to
/// [`MarkdownRenderer::with_processor`](crate::MarkdownRenderer::with_processor).
pub trait CodeBlockProcessor: Send {
    /// Called before each document is rendered.
    fn begin_document(&mut self) {}

    /// Process a fenced block.
    fn process(&mut self, block: &FencedBlock<'_>, document: &DocumentContext) -> ProcessResult;

    /// Drain warnings produced since the last call.
    fn take_warnings(&mut self) -> Vec<String> {
        Vec::new()
    }
}

/// Parsed fence info string.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct FenceInfo {
    pub(crate) language: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) positional: Vec<String>,
}

/// Split the fence info string into quoted-aware tokens.
fn tokenize(info: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in info.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => quote = Some(c),
            (None, c) if c.is_whitespace() || c == ',' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            (None, c) => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse fence info string into name, named and positional arguments.
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> FenceInfo {
    let mut tokens = tokenize(info).into_iter();
    let Some(language) = tokens.next() else {
        return FenceInfo::default();
    };

    let mut parsed = FenceInfo {
        language,
        ..FenceInfo::default()
    };
    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                parsed.attrs.insert(key.to_owned(), value.to_owned());
            }
            _ => parsed.positional.push(token),
        }
    }
    parsed
}
