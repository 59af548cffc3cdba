//! Page title extraction

use select::document::Document;
use select::predicate::{Name, Predicate};

/// Title of an HTML page: the text of the first `<title>` directly inside `<head>`.
///
/// Returns an empty string when the page has none. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn extract_title(page: &[u8]) -> String {
    let html = String::from_utf8_lossy(page);
    let document = Document::from(html.as_ref());

    document
        .find(Name("head").child(Name("title")))
        .next()
        .map(|node| node.text().trim().to_owned())
        .unwrap_or_default()
}
