//! Element Locator
//!
//! Finds repeating record elements through a prioritized list of selector
//! candidates, and interactive controls by their visible text.
//!
//! Markup on the sites this targets is loosely versioned, so no single
//! selector is trusted: every candidate is evaluated and the union is kept,
//! deduplicated by node identity. A candidate the selector engine rejects is
//! skipped with a warning.

use std::collections::HashSet;

use dom_query::{Document, Selection};
use tracing::warn;

use crate::dom;
use crate::page::ControlHandle;

/// Outcome of a full scan.
#[derive(Debug, Default)]
pub struct Located<'a> {
    /// Matched elements in candidate order, then document order, unique by
    /// identity.
    pub elements: Vec<Selection<'a>>,

    /// One entry per rejected selector.
    pub warnings: Vec<String>,
}

/// Evaluate each selector in order and collect the union of matches.
///
/// Matches of a later selector are appended only if the same node was not
/// already returned by an earlier one. Content equality is not considered.
#[must_use]
pub fn locate<'a, S: AsRef<str>>(doc: &'a Document, selectors: &[S]) -> Located<'a> {
    let mut located = Located::default();
    let mut seen = HashSet::new();

    for selector in selectors {
        let selector = selector.as_ref();
        let matcher = match dom::compile(selector) {
            Ok(matcher) => matcher,
            Err(err) => {
                warn!(selector, error = %err, "skipping unparseable selector");
                located
                    .warnings
                    .push(format!("unparseable selector {selector:?}: {err}"));
                continue;
            }
        };

        for node in doc.select_matcher(&matcher).nodes() {
            if seen.insert(node.id) {
                located.elements.push(Selection::from(*node));
            }
        }
    }

    located
}

/// Find controls of the given kind whose visible text contains `label`,
/// ignoring case.
///
/// Selectors cannot express "element containing text X", so this is a plain
/// scan over every element matching `control_selector`.
#[must_use]
pub fn find_controls_by_label(
    doc: &Document,
    control_selector: &str,
    label: &str,
) -> Vec<ControlHandle> {
    let needle = dom::normalize_whitespace(label).to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let matcher = match dom::compile(control_selector) {
        Ok(matcher) => matcher,
        Err(err) => {
            warn!(selector = control_selector, error = %err, "unparseable control selector");
            return Vec::new();
        }
    };

    doc.select_matcher(&matcher)
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let text = dom::normalized_text(&Selection::from(*node));
            text.to_lowercase().contains(&needle).then(|| ControlHandle {
                selector: control_selector.to_string(),
                index,
                label: label.to_string(),
                text,
            })
        })
        .collect()
}
