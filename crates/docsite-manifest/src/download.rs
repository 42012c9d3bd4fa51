//! Downloadable files listed in the manifest.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DownloadError;

#[derive(Debug, Deserialize)]
struct RawDownload {
    description: Option<String>,
    target: Option<String>,
}

/// A download resolved against the source root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target: String,
    /// File size in kilobytes (1000 bytes), rounded to nearest.
    pub kb_size: u64,
}

impl DownloadEntry {
    /// Validate a raw entry and measure its target file under `source_root`.
    pub fn resolve(value: Value, source_root: &Path) -> Result<Self, DownloadError> {
        let raw: RawDownload = serde_json::from_value(value).map_err(DownloadError::Malformed)?;
        let target = raw
            .target
            .filter(|t| !t.is_empty())
            .ok_or(DownloadError::MissingTarget)?;

        let path = source_root.join(&target);
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Err(DownloadError::NotFound { path }),
        };
        if !is_within(&path, source_root) {
            return Err(DownloadError::OutsideSource { path });
        }

        Ok(Self {
            description: raw.description,
            target,
            kb_size: kilobytes(metadata.len()),
        })
    }
}

/// Whether `path` resolves to a location inside `root`, after symlinks and `..`.
fn is_within(path: &Path, root: &Path) -> bool {
    match (path.canonicalize(), root.canonicalize()) {
        (Ok(path), Ok(root)) => path.starts_with(root),
        _ => false,
    }
}

/// Round a byte count to kilobytes, halves rounding up.
fn kilobytes(bytes: u64) -> u64 {
    bytes.saturating_add(500) / 1000
}

/// Resolve every entry, dropping (and logging) the invalid ones.
pub(crate) fn resolve_downloads(values: Vec<Value>, source_root: &Path) -> Vec<DownloadEntry> {
    values
        .into_iter()
        .filter_map(|value| match DownloadEntry::resolve(value, source_root) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("{e}");
                None
            }
        })
        .collect()
}
