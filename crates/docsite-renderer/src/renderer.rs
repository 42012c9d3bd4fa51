//! Markdown renderer with registered code block processors.

use std::borrow::Cow;
use std::collections::HashMap;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::code_block::{
    CodeBlockProcessor, DocumentContext, FencedBlock, ProcessResult, parse_fence_info,
};
use crate::util::document_link;

/// Result of rendering one document.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML fragment.
    pub html: String,
    /// Attributes read from the document's front matter.
    pub attributes: HashMap<String, String>,
    /// Warnings produced while rendering (processors and front matter).
    pub warnings: Vec<String>,
}

/// Fenced block being collected.
struct PendingFence<'a> {
    info: CowStr<'a>,
    source: String,
}

/// Markdown renderer owning its code block processors.
///
/// The renderer is reusable: processors are registered once and every call
/// to [`render`](Self::render) starts from a clean per-document state.
pub struct MarkdownRenderer {
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    gfm: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a renderer with GFM extensions enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
            gfm: true,
        }
    }

    /// Enable or disable GitHub Flavored Markdown features
    /// (tables, strikethrough, task lists).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Register a code block processor.
    ///
    /// Processors are consulted in registration order; the first returning
    /// [`ProcessResult::Inline`] wins.
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let base = Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
        if self.gfm {
            base | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            base
        }
    }

    /// Render a markdown document to an HTML fragment.
    ///
    /// `root` is the relative prefix from the document back to the output
    /// root, handed to processors through [`DocumentContext::root`].
    pub fn render(&mut self, markdown: &str, root: &str) -> RenderResult {
        for processor in &mut self.processors {
            processor.begin_document();
        }

        let mut document = DocumentContext::new(root);
        let mut warnings = Vec::new();
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut fence: Option<PendingFence<'_>> = None;
        let mut front_matter: Option<String> = None;
        let mut fence_index = 0;

        for event in Parser::new_ext(markdown, self.parser_options()) {
            match event {
                Event::Start(Tag::MetadataBlock(_)) => front_matter = Some(String::new()),
                Event::End(TagEnd::MetadataBlock(_)) => {
                    if let Some(yaml) = front_matter.take() {
                        document.extend_attributes(parse_front_matter(&yaml, &mut warnings));
                    }
                }
                Event::Text(text) if front_matter.is_some() => {
                    if let Some(buffer) = front_matter.as_mut() {
                        buffer.push_str(&text);
                    }
                }
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    fence = Some(PendingFence {
                        info,
                        source: String::new(),
                    });
                }
                Event::Text(text) if fence.is_some() => {
                    if let Some(pending) = fence.as_mut() {
                        pending.source.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if fence.is_some() => {
                    if let Some(pending) = fence.take() {
                        let index = fence_index;
                        fence_index += 1;
                        match self.process_fence(&pending, &document, index) {
                            Some(replacement) => events.push(Event::Html(replacement.into())),
                            None => {
                                events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(
                                    pending.info,
                                ))));
                                events.push(Event::Text(pending.source.into()));
                                events.push(Event::End(TagEnd::CodeBlock));
                            }
                        }
                    }
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let rewritten = match document_link(&dest_url) {
                        Cow::Owned(rewritten) => Some(rewritten),
                        Cow::Borrowed(_) => None,
                    };
                    let dest_url = rewritten.map_or(dest_url, CowStr::from);
                    events.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                }
                other => events.push(other),
            }
        }

        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, events.into_iter());

        for processor in &mut self.processors {
            warnings.extend(processor.take_warnings());
        }

        RenderResult {
            html: output,
            attributes: document.into_attributes(),
            warnings,
        }
    }

    /// Offer a fenced block to processors in order.
    fn process_fence(
        &mut self,
        pending: &PendingFence<'_>,
        document: &DocumentContext,
        index: usize,
    ) -> Option<String> {
        let info = parse_fence_info(&pending.info);
        if info.language.is_empty() {
            return None;
        }

        let block = FencedBlock {
            language: &info.language,
            attrs: &info.attrs,
            positional: &info.positional,
            source: &pending.source,
            index,
        };
        self.processors
            .iter_mut()
            .find_map(|processor| match processor.process(&block, document) {
                ProcessResult::Inline(replacement) => Some(replacement),
                ProcessResult::PassThrough => None,
            })
    }
}

/// Read scalar front-matter values as document attributes.
fn parse_front_matter(yaml: &str, warnings: &mut Vec<String>) -> Vec<(String, String)> {
    if yaml.trim().is_empty() {
        return Vec::new();
    }

    let mapping: serde_yaml::Mapping = match serde_yaml::from_str(yaml) {
        Ok(mapping) => mapping,
        Err(e) => {
            warnings.push(format!("ignoring invalid front matter: {e}"));
            return Vec::new();
        }
    };

    mapping
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.as_str()?.to_owned();
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((key, value))
        })
        .collect()
}
