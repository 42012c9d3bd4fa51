//! Site manifest (`docsite.config.json`) validation and normalization.
//!
//! The manifest names the site, its navigation tree and downloadable files.
//! Validation turns the author's loosely shaped JSON into a [`SiteManifest`]:
//!
//! - `contents`, `children` and `downloads` may be a single object or a list
//!   and are normalized to lists.
//! - Items missing a caption or path are dropped with a warning, together with
//!   their children. Siblings are unaffected.
//! - Relative `.md` paths are rewritten to `.html`.
//! - Downloads are measured on disk (`kbSize`); missing files are dropped.
//!
//! Only a missing title, missing contents, or contents that end up empty fail
//! the whole manifest.
//!
//! ```
//! use docsite_manifest::SiteManifest;
//! use std::path::Path;
//!
//! let json = r#"{"title": "Docs", "contents": {"caption": "Home", "path": "index.md"}}"#;
//! let manifest = SiteManifest::from_json(json, Path::new(".")).unwrap();
//! assert_eq!(manifest.contents[0].path, "index.html");
//! ```

mod content;
mod download;
mod error;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use content::{ContentItem, OneOrMany};
pub use download::DownloadEntry;
pub use error::{ContentItemError, DownloadError, ManifestError};

/// Manifest file name, read from the source root and written to the output root.
pub const MANIFEST_FILENAME: &str = "docsite.config.json";

#[derive(Debug, Deserialize)]
struct RawManifest {
    title: Option<String>,
    logo: Option<String>,
    downloads: Option<OneOrMany<Value>>,
    contents: Option<OneOrMany<Value>>,
}

/// Normalized, build-ready manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteManifest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub downloads: Vec<DownloadEntry>,
    pub contents: Vec<ContentItem>,
}

impl SiteManifest {
    /// Read and validate `docsite.config.json` from `source_root`.
    pub fn load(source_root: &Path) -> Result<Self, ManifestError> {
        let path = source_root.join(MANIFEST_FILENAME);
        let json = std::fs::read_to_string(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded manifest");
        Self::from_json(&json, source_root)
    }

    /// Parse and validate manifest JSON. Downloads resolve against `source_root`.
    pub fn from_json(json: &str, source_root: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_str(json)?;
        Self::validate(raw, source_root)
    }

    fn validate(raw: RawManifest, source_root: &Path) -> Result<Self, ManifestError> {
        let title = raw
            .title
            .filter(|t| !t.is_empty())
            .ok_or(ManifestError::NoTitle)?;
        let contents = raw.contents.ok_or(ManifestError::NoContents)?;

        let downloads = raw
            .downloads
            .map(|d| download::resolve_downloads(d.into_vec(), source_root))
            .unwrap_or_default();

        let contents = content::normalize_items(contents.into_vec());
        if contents.is_empty() {
            return Err(ManifestError::NoValidContents);
        }

        Ok(Self {
            title,
            logo: raw.logo,
            downloads,
            contents,
        })
    }

    /// Pretty-printed JSON for the site shell.
    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the normalized manifest into `output_dir`.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, ManifestError> {
        let path = output_dir.join(MANIFEST_FILENAME);
        std::fs::write(&path, self.to_json_pretty()?).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn parse(json: &str) -> Result<SiteManifest, ManifestError> {
        SiteManifest::from_json(json, Path::new("."))
    }

    #[test]
    fn test_missing_title() {
        let err = parse(r#"{"contents": {"caption": "A", "path": "a.md"}}"#).unwrap_err();
        assert!(matches!(err, ManifestError::NoTitle));
        assert!(err.to_string().contains("no title"));

        let err = parse(r#"{"title": "", "contents": []}"#).unwrap_err();
        assert!(matches!(err, ManifestError::NoTitle));
    }

    #[test]
    fn test_missing_title_reported_before_contents() {
        let err = parse("{}").unwrap_err();
        assert!(matches!(err, ManifestError::NoTitle));
    }

    #[test]
    fn test_missing_contents() {
        let err = parse(r#"{"title": "Docs"}"#).unwrap_err();
        assert!(matches!(err, ManifestError::NoContents));
        assert!(err.to_string().contains("no contents"));
    }

    #[test]
    fn test_no_valid_contents() {
        let err = parse(r#"{"title": "Docs", "contents": [{"caption": "A"}, {"path": "b.md"}]}"#)
            .unwrap_err();
        assert!(matches!(err, ManifestError::NoValidContents));

        let err = parse(r#"{"title": "Docs", "contents": {"caption": "A"}}"#).unwrap_err();
        assert!(matches!(err, ManifestError::NoValidContents));

        let err = parse(r#"{"title": "Docs", "contents": []}"#).unwrap_err();
        assert!(matches!(err, ManifestError::NoValidContents));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse(r#"{"title": "Docs", "#).unwrap_err();
        assert!(matches!(err, ManifestError::Malformed(_)));
    }

    #[test]
    fn test_invalid_item_dropped_siblings_kept() {
        let manifest = parse(
            r#"{"title": "Docs", "contents": [
                {"caption": "One", "path": "one.md"},
                {"caption": "Broken"},
                {"caption": "Three", "path": "three.html"}
            ]}"#,
        )
        .unwrap();
        let paths: Vec<_> = manifest.contents.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["one.html", "three.html"]);
    }

    #[test]
    fn test_path_rewrite_rules() {
        let manifest = parse(
            r#"{"title": "Docs", "contents": [
                {"caption": "A", "path": "a/b.md"},
                {"caption": "B", "path": "http://x/y.md"},
                {"caption": "C", "path": "/abs/y.md"},
                {"caption": "D", "path": "files/spec.pdf"}
            ]}"#,
        )
        .unwrap();
        let paths: Vec<_> = manifest.contents.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["a/b.html", "http://x/y.md", "/abs/y.md", "files/spec.pdf"]);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("guide.pdf"), vec![0u8; 1500]).unwrap();
        let json = r#"{
            "title": "Docs",
            "logo": "logo.png",
            "downloads": {"description": "Guide", "target": "guide.pdf"},
            "contents": [{
                "caption": "Home",
                "keyWords": "start",
                "path": "index.md",
                "children": {"caption": "Setup", "path": "setup/INSTALL.MD"}
            }]
        }"#;

        let first = SiteManifest::from_json(json, dir.path()).unwrap();
        let second = SiteManifest::from_json(&first.to_json_pretty().unwrap(), dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.contents[0].children[0].path, "setup/INSTALL.html");
        assert_eq!(second.downloads[0].kb_size, 2);
    }

    #[test]
    fn test_single_item_end_to_end_json() {
        let manifest =
            parse(r#"{"title":"Docs","contents":{"caption":"Home","path":"index.md"}}"#).unwrap();
        let value: Value = serde_json::from_str(&manifest.to_json_pretty().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "title": "Docs",
                "contents": [{"caption": "Home", "path": "index.html"}]
            })
        );
    }

    #[test]
    fn test_invalid_downloads_omitted() {
        let manifest = parse(
            r#"{"title": "Docs",
                "downloads": [{"target": "missing.zip"}, {"description": "no target"}],
                "contents": {"caption": "Home", "path": "index.md"}}"#,
        )
        .unwrap();
        assert!(manifest.downloads.is_empty());
        assert!(!manifest.to_json_pretty().unwrap().contains("downloads"));
    }

    #[test]
    fn test_load_and_write() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::write(
            source.path().join(MANIFEST_FILENAME),
            r#"{"title": "Docs", "contents": {"caption": "Home", "path": "index.md"}}"#,
        )
        .unwrap();

        let manifest = SiteManifest::load(source.path()).unwrap();
        let written = manifest.write(output.path()).unwrap();
        assert_eq!(written, output.path().join(MANIFEST_FILENAME));

        let text = std::fs::read_to_string(written).unwrap();
        assert!(text.contains("\n  \"title\": \"Docs\""));
        assert!(text.contains("\"path\": \"index.html\""));
    }

    #[test]
    fn test_load_missing_file() {
        let source = TempDir::new().unwrap();
        let err = SiteManifest::load(source.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
