//! Harvest pipeline orchestration.
//!
//! expand (optional) -> snapshot -> locate -> extract -> dedup -> export
//!
//! Only the expander touches the live page more than once; the rest works on
//! a single snapshot.

use std::collections::HashSet;

use dom_query::NodeId;
use tracing::{info, warn};
use url::Url;

use crate::dedup::Deduplicator;
use crate::dom;
use crate::error::Result;
use crate::expander;
use crate::export;
use crate::locator;
use crate::options::Options;
use crate::page::Page;
use crate::record;
use crate::result::{ExtractionReport, Harvest, ResultSet};

/// Run the full pipeline against a live page.
///
/// # Errors
///
/// Returns `Error::Config` for invalid options (before the page is touched)
/// and `Error::Export` if the result cannot be serialized. Every other
/// problem is recorded in the report's warnings.
pub async fn harvest<P: Page + ?Sized>(page: &mut P, options: &Options) -> Result<Harvest> {
    options.validate()?;
    let mut report = ExtractionReport::default();

    if options.auto_expand {
        let expansion = expander::expand(page, options).await;
        report.expansion = expansion.report;
        report.warnings.extend(expansion.warnings);
    }

    let url = page.url().await.unwrap_or_else(|err| {
        warn!(error = %err, "could not read page url");
        report.warnings.push(format!("url failed: {err}"));
        String::new()
    });

    let html = page.html().await.unwrap_or_else(|err| {
        warn!(error = %err, "could not snapshot page, treating it as empty");
        report.warnings.push(format!("snapshot failed: {err}"));
        String::new()
    });

    finish(&html, &url, options, report)
}

/// Run the pipeline over an HTML snapshot, without expansion.
///
/// # Errors
///
/// Same as [`harvest`].
pub fn harvest_html(html: &str, url: &str, options: &Options) -> Result<Harvest> {
    options.validate()?;
    finish(html, url, options, ExtractionReport::default())
}

fn finish(html: &str, url: &str, options: &Options, mut report: ExtractionReport) -> Result<Harvest> {
    let result = scan(html, url, options, &mut report);
    let export = export::export(&result, options)?;

    info!(
        located = report.located,
        skipped = report.skipped,
        duplicates = report.duplicates,
        records = result.children.len(),
        "harvest complete"
    );

    Ok(Harvest {
        result,
        payload: export.payload,
        suggested_name: export.suggested_name,
        report,
    })
}

/// Locate, extract and deduplicate over one snapshot.
///
/// Zero located elements yield an empty `children` list.
#[must_use]
pub fn scan(html: &str, url: &str, options: &Options, report: &mut ExtractionReport) -> ResultSet {
    let doc = dom::parse(html);
    let base = Url::parse(url).ok();

    let located = locator::locate(&doc, &options.selector_candidates);
    report.warnings.extend(located.warnings);
    report.located = located.elements.len();

    let comment_ids: HashSet<NodeId> = located
        .elements
        .iter()
        .filter_map(dom::node_id)
        .collect();

    let mut records = Vec::with_capacity(located.elements.len());
    for element in &located.elements {
        match record::extract_child(element, &comment_ids, base.as_ref(), options.dedup_strategy) {
            Some(child) => records.push(child),
            None => report.skipped += 1,
        }
    }

    let mut dedup = Deduplicator::new();
    let children = dedup.filter(records);
    report.duplicates = dedup.dropped();

    ResultSet {
        parent: record::extract_parent(&doc, &comment_ids, url),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_counts() {
        let html = r#"
            <ul class="comments-comments-list">
                <div><span class="author">A</span><p>one</p></div>
                <div><span class="author">B</span><p>two</p></div>
                <div class="spacer"></div>
            </ul>
            <div class="comments-comment-item"><span class="author">A</span><p>one</p></div>
        "#;
        let options = Options {
            selector_candidates: vec![
                ".comments-comments-list > div".to_string(),
                ".comments-comment-item".to_string(),
            ],
            ..Options::default()
        };
        let mut report = ExtractionReport::default();

        let result = scan(html, "", &options, &mut report);
        assert_eq!(report.located, 4);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(result.children.len(), 2);
    }

    #[test]
    fn test_harvest_html_rejects_bad_options() {
        let options = Options { max_scroll_iterations: 0, ..Options::default() };
        assert!(matches!(
            harvest_html("", "", &options),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_bad_selector_surfaces_as_warning() {
        let options = Options {
            selector_candidates: vec!["div:eq(0)".to_string(), ".c".to_string()],
            ..Options::default()
        };

        let harvest = harvest_html(r#"<div class="c"><p>hi</p></div>"#, "", &options).unwrap();
        assert_eq!(harvest.result.children.len(), 1);
        assert_eq!(harvest.report.warnings.len(), 1);
    }
}
