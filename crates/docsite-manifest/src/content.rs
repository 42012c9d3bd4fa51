//! Navigation content items.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use docsite_renderer::document_output_path;

use crate::error::ContentItemError;

/// A value that may be written either as a single element or as a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Normalize into a list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// Content item as written by the author.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContentItem {
    caption: Option<String>,
    description: Option<String>,
    key_words: Option<OneOrMany<String>>,
    path: Option<String>,
    icon: Option<String>,
    children: Option<OneOrMany<Value>>,
}

/// A validated navigation entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_words: Option<OneOrMany<String>>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ContentItem>,
}

impl ContentItem {
    /// Validate one raw item and, recursively, its children.
    ///
    /// Invalid children are dropped with a warning; the item itself fails only
    /// when its own caption or path is missing.
    pub fn from_value(value: Value) -> Result<Self, ContentItemError> {
        let raw: RawContentItem =
            serde_json::from_value(value).map_err(ContentItemError::Malformed)?;

        let caption = raw
            .caption
            .filter(|c| !c.is_empty())
            .ok_or(ContentItemError::NoCaption)?;
        let Some(path) = raw.path.filter(|p| !p.is_empty()) else {
            return Err(ContentItemError::NoPath { caption });
        };

        let children = raw
            .children
            .map(|children| normalize_items(children.into_vec()))
            .unwrap_or_default();

        Ok(Self {
            caption,
            description: raw.description,
            key_words: raw.key_words,
            path: document_output_path(&path).into_owned(),
            icon: raw.icon,
            children,
        })
    }
}

/// Validate a list of raw items, dropping (and logging) the invalid ones.
pub(crate) fn normalize_items(values: Vec<Value>) -> Vec<ContentItem> {
    values
        .into_iter()
        .filter_map(|value| match ContentItem::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("{e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_item_requires_caption() {
        let err = ContentItem::from_value(json!({"path": "a.md"})).unwrap_err();
        assert!(matches!(err, ContentItemError::NoCaption));

        let err = ContentItem::from_value(json!({"caption": "", "path": "a.md"})).unwrap_err();
        assert!(matches!(err, ContentItemError::NoCaption));
    }

    #[test]
    fn test_item_requires_path() {
        let err = ContentItem::from_value(json!({"caption": "Intro"})).unwrap_err();
        assert!(matches!(err, ContentItemError::NoPath { ref caption } if caption == "Intro"));
    }

    #[test]
    fn test_item_with_wrong_types_is_malformed() {
        let err = ContentItem::from_value(json!({"caption": 3, "path": "a.md"})).unwrap_err();
        assert!(matches!(err, ContentItemError::Malformed(_)));
    }

    #[test]
    fn test_item_path_rewritten() {
        let item = ContentItem::from_value(json!({"caption": "A", "path": "guide/A.MD"})).unwrap();
        assert_eq!(item.path, "guide/A.html");

        let item = ContentItem::from_value(json!({"caption": "B", "path": "https://x/y.md"})).unwrap();
        assert_eq!(item.path, "https://x/y.md");
    }

    #[test]
    fn test_item_keeps_optional_fields() {
        let item = ContentItem::from_value(json!({
            "caption": "A",
            "description": "About A",
            "keyWords": ["x", "y"],
            "path": "a.md",
            "icon": "book"
        }))
        .unwrap();
        assert_eq!(item.description.as_deref(), Some("About A"));
        assert_eq!(
            item.key_words,
            Some(OneOrMany::Many(vec!["x".to_owned(), "y".to_owned()]))
        );
        assert_eq!(item.icon.as_deref(), Some("book"));
    }

    #[test]
    fn test_single_child_normalized_to_list() {
        let item = ContentItem::from_value(json!({
            "caption": "Parent",
            "path": "p.md",
            "children": {"caption": "Child", "path": "c.md"}
        }))
        .unwrap();
        assert_eq!(item.children.len(), 1);
        assert_eq!(item.children[0].path, "c.html");
    }

    #[test]
    fn test_invalid_children_dropped_siblings_kept() {
        let item = ContentItem::from_value(json!({
            "caption": "Parent",
            "path": "p.md",
            "children": [
                {"caption": "Good", "path": "g.md"},
                {"caption": "No path"},
                {"path": "no-caption.md"}
            ]
        }))
        .unwrap();
        let captions: Vec<_> = item.children.iter().map(|c| c.caption.as_str()).collect();
        assert_eq!(captions, vec!["Good"]);
    }

    #[test]
    fn test_empty_children_omitted_from_json() {
        let item = ContentItem::from_value(json!({
            "caption": "Parent",
            "path": "p.md",
            "children": [{"caption": "Bad"}]
        }))
        .unwrap();
        assert!(item.children.is_empty());
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"caption": "Parent", "path": "p.html"}));
    }

    #[test]
    fn test_invalid_parent_hides_children() {
        let items = normalize_items(vec![
            json!({"caption": "Orphan parent", "children": [{"caption": "C", "path": "c.md"}]}),
            json!({"caption": "Sibling", "path": "s.md"}),
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].caption, "Sibling");
    }
}
