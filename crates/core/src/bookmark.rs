//! Bookmark data shared between the store, the fetcher and the HTTP API.

use serde::{Deserialize, Serialize};

/// Title recorded for entries whose page fetch never produced a usable title.
///
/// Rows carrying this exact two-character title are hidden from the ranking views.
pub const PLACEHOLDER_TITLE: &str = "\"\"";

/// Data extracted for a bookmark when it is first added
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkData {
    /// Page title, empty when the page had none
    pub title: String,
}

impl BookmarkData {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

/// A bookmark as returned by the ranking views and search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkEntry {
    pub title: String,
    pub url: String,
    pub is_favorite: bool,
}

impl BookmarkEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>, is_favorite: bool) -> Self {
        Self { title: title.into(), url: url.into(), is_favorite }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = BookmarkEntry::new("Example Domain", "http://example.com", true);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["title"], "Example Domain");
        assert_eq!(json["url"], "http://example.com");
        assert_eq!(json["isFavorite"], true);
    }

    #[test]
    fn test_placeholder_is_empty_quoted_string() {
        assert_eq!(PLACEHOLDER_TITLE.len(), 2);
        assert_eq!(serde_json::to_string("").unwrap(), PLACEHOLDER_TITLE);
    }
}
