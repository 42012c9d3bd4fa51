//! Path and escaping helpers shared by the renderer and the site builder.

use std::borrow::Cow;
use std::path::{Component, Path};

/// Extension of source documents (without the dot).
pub const SOURCE_EXTENSION: &str = "md";

/// Extension of rendered documents (without the dot).
pub const OUTPUT_EXTENSION: &str = "html";

const SOURCE_SUFFIX: &str = ".md";

/// Strip the source-document suffix, matching case-insensitively.
fn strip_source_suffix(path: &str) -> Option<&str> {
    let start = path.len().checked_sub(SOURCE_SUFFIX.len())?;
    let suffix = path.get(start..)?;
    suffix
        .eq_ignore_ascii_case(SOURCE_SUFFIX)
        .then(|| &path[..start])
}

/// Whether a file name refers to a source document.
#[must_use]
pub fn is_source_document(name: &str) -> bool {
    strip_source_suffix(name).is_some()
}

/// Rewrite a relative source-document path to its rendered-output path.
///
/// Only paths without a scheme separator (`:`) that are not absolute and end
/// with `.md` (any case) are rewritten. Everything else, including paths that
/// already end in `.html`, is returned unchanged.
///
/// ```
/// use docsite_renderer::document_output_path;
///
/// assert_eq!(document_output_path("a/b.md"), "a/b.html");
/// assert_eq!(document_output_path("http://x/y.md"), "http://x/y.md");
/// assert_eq!(document_output_path("/abs/y.md"), "/abs/y.md");
/// ```
#[must_use]
pub fn document_output_path(path: &str) -> Cow<'_, str> {
    if path.contains(':') || path.starts_with('/') {
        return Cow::Borrowed(path);
    }
    match strip_source_suffix(path) {
        Some(stem) => Cow::Owned(format!("{stem}.{OUTPUT_EXTENSION}")),
        None => Cow::Borrowed(path),
    }
}

/// Rewrite a link found inside a document.
///
/// Same rule as [`document_output_path`], applied to the part before any
/// `#fragment` or `?query`.
#[must_use]
pub fn document_link(url: &str) -> Cow<'_, str> {
    let split = url.find(['#', '?']).unwrap_or(url.len());
    let (path, rest) = url.split_at(split);
    match document_output_path(path) {
        Cow::Owned(rewritten) => Cow::Owned(format!("{rewritten}{rest}")),
        Cow::Borrowed(_) => Cow::Borrowed(url),
    }
}

/// Relative prefix leading from a document directory back to the output root.
///
/// `relative_dir` is the document's directory relative to the output root.
/// Returns an empty string for documents at the root, `"../"` one level down,
/// and so on.
#[must_use]
pub fn root_prefix(relative_dir: &Path) -> String {
    let depth = relative_dir
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    "../".repeat(depth)
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_path_relative_document() {
        assert_eq!(document_output_path("a/b.md"), "a/b.html");
        assert_eq!(document_output_path("index.md"), "index.html");
    }

    #[test]
    fn test_output_path_case_insensitive() {
        assert_eq!(document_output_path("Guide/Intro.MD"), "Guide/Intro.html");
    }

    #[test]
    fn test_output_path_scheme_untouched() {
        assert_eq!(document_output_path("http://x/y.md"), "http://x/y.md");
        assert_eq!(document_output_path("mailto:a.md"), "mailto:a.md");
    }

    #[test]
    fn test_output_path_absolute_untouched() {
        assert_eq!(document_output_path("/abs/y.md"), "/abs/y.md");
    }

    #[test]
    fn test_output_path_is_idempotent() {
        let once = document_output_path("a/b.md").into_owned();
        assert_eq!(document_output_path(&once), "a/b.html");
    }

    #[test]
    fn test_output_path_other_assets_untouched() {
        assert_eq!(document_output_path("files/report.pdf"), "files/report.pdf");
        assert_eq!(document_output_path("md"), "md");
    }

    #[test]
    fn test_output_path_multibyte_tail() {
        assert_eq!(document_output_path("notes/日本"), "notes/日本");
    }

    #[test]
    fn test_document_link_keeps_fragment() {
        assert_eq!(document_link("setup.md#install"), "setup.html#install");
        assert_eq!(document_link("../api.md?v=2"), "../api.html?v=2");
        assert_eq!(document_link("#top"), "#top");
        assert_eq!(document_link("https://example.com/a.md"), "https://example.com/a.md");
    }

    #[test]
    fn test_is_source_document() {
        assert!(is_source_document("index.md"));
        assert!(is_source_document("README.MD"));
        assert!(!is_source_document("index.html"));
        assert!(!is_source_document("notes.mdx"));
    }

    #[test]
    fn test_root_prefix() {
        assert_eq!(root_prefix(Path::new("")), "");
        assert_eq!(root_prefix(Path::new("guide")), "../");
        assert_eq!(root_prefix(Path::new("guide/deep")), "../../");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
    }
}
