//! DOM Operations Adapter
//!
//! Small helpers over the `dom_query` crate used by the locator and the
//! record extractor. Every helper tolerates empty selections.

use dom_query::{Matcher, NodeId};

// Re-export core types for external use
pub use dom_query::{Document, Selection};

// Re-export StrTendril for external use
pub use tendril::StrTendril;

// === Parsing ===

/// Parse an HTML snapshot into a document.
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Compile a selector, returning the parser's complaint on failure.
///
/// `dom_query`'s `select` panics on an invalid selector, so anything
/// user-supplied goes through here first.
///
/// # Errors
///
/// Returns a description of the parse failure.
pub fn compile(selector: &str) -> Result<Matcher, String> {
    Matcher::new(selector).map_err(|e| format!("{e:?}"))
}

// === Attribute Operations ===

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes()
        .first()
        .and_then(dom_query::NodeRef::node_name)
        .map(|t| t.to_string())
}

/// Identity of the first node in a selection.
///
/// Two selections obtained through different selectors compare equal here
/// exactly when they point at the same element.
#[inline]
#[must_use]
pub fn node_id(sel: &Selection) -> Option<NodeId> {
    sel.nodes().first().map(|n| n.id)
}

// === Text Content ===

/// Get all text content of node and descendants
///
/// Returns `StrTendril` for zero-copy passing.
#[inline]
#[must_use]
pub fn text_content(sel: &Selection) -> StrTendril {
    sel.text()
}

/// Text content with runs of whitespace collapsed to single spaces.
#[must_use]
pub fn normalized_text(sel: &Selection) -> String {
    normalize_whitespace(&text_content(sel))
}

/// Collapse whitespace runs and trim.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_select() {
        let doc = parse(r#"<div id="main" class="container">content</div>"#);
        let div = doc.select("div");

        assert_eq!(get_attribute(&div, "id"), Some("main".to_string()));
        assert_eq!(get_attribute(&div, "class"), Some("container".to_string()));
        assert_eq!(get_attribute(&div, "data-test"), None);
    }

    #[test]
    fn test_compile_valid_and_invalid() {
        assert!(compile("div.comment > p").is_ok());
        assert!(compile(r#"[data-test-id^="comments-"]"#).is_ok());
        assert!(compile(r#"button:contains("Load more")"#).is_ok());
        assert!(compile("button:eq(0)").is_err());
        assert!(compile("div[").is_err());
    }

    #[test]
    fn test_tag_name() {
        let doc = parse(r#"<article><section>content</section></article>"#);

        assert_eq!(tag_name(&doc.select("article")), Some("article".to_string()));
        assert_eq!(tag_name(&doc.select("section")), Some("section".to_string()));
        assert_eq!(tag_name(&doc.select("span")), None);
    }

    #[test]
    fn test_node_id_is_identity() {
        let doc = parse(r#"<div class="a b" id="x">one</div><div class="a">two</div>"#);

        let by_class = doc.select(".b");
        let by_id = doc.select("#x");
        let other = doc.select("div:nth-child(2)");

        assert_eq!(node_id(&by_class), node_id(&by_id));
        assert_ne!(node_id(&by_class), node_id(&other));
        assert_eq!(node_id(&doc.select("span")), None);
    }

    #[test]
    fn test_normalized_text() {
        let doc = parse("<div>  text \n\t <span>nested</span>   more </div>");
        let div = doc.select("div");

        assert!(text_content(&div).contains("nested"));
        assert_eq!(normalized_text(&div), "text nested more");
    }

    #[test]
    fn test_operations_on_empty_selection() {
        let doc = parse(r#"<div>content</div>"#);
        let empty = doc.select("span");

        assert_eq!(text_content(&empty), "".into());
        assert_eq!(normalized_text(&empty), "");
        assert_eq!(get_attribute(&empty, "href"), None);
    }
}
