//! Record Extraction
//!
//! Turns located elements into typed records. Each field has its own
//! prioritized fallback table; a field nobody can find is an empty string.
//!
//! Lookups are scoped: a candidate that sits inside another located comment
//! (a nested reply, say) does not count as a field of the enclosing element,
//! and no comment contributes to the parent post's fields.

use std::collections::HashSet;
use std::sync::{LazyLock, OnceLock};

use dom_query::{Document, Matcher, NodeId, Selection};
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::dedup;
use crate::dom;
use crate::options::DedupStrategy;
use crate::result::{ChildRecord, ParentRecord};

/// A prioritized selector list, compiled once on first use.
pub struct Fallbacks {
    selectors: &'static [&'static str],
    compiled: OnceLock<Vec<Matcher>>,
}

impl Fallbacks {
    #[must_use]
    pub const fn new(selectors: &'static [&'static str]) -> Self {
        Self { selectors, compiled: OnceLock::new() }
    }

    /// Selector source text, in priority order.
    #[must_use]
    pub fn selectors(&self) -> &'static [&'static str] {
        self.selectors
    }

    /// Compiled matchers, in priority order.
    pub fn matchers(&self) -> &[Matcher] {
        self.compiled.get_or_init(|| {
            self.selectors
                .iter()
                .filter_map(|selector| match dom::compile(selector) {
                    Ok(matcher) => Some(matcher),
                    Err(err) => {
                        warn!(selector, error = %err, "dropping unparseable fallback selector");
                        None
                    }
                })
                .collect()
        })
    }
}

/// Time elements carrying a machine-readable value
static TIME_WITH_DATETIME: Fallbacks = Fallbacks::new(&["time[datetime]"]);

// ============================================================
// COMMENT FIELD FALLBACKS
// ============================================================

/// Commenter display name
pub static COMMENT_AUTHOR: Fallbacks = Fallbacks::new(&[
    ".comments-post-meta__name-text",
    ".comments-comment-meta__description-title",
    ".comments-comment-item__post-meta .hoverable-link-text",
    ".comment-author .name",
    ".comment-author",
    r#"[itemprop="author"] [itemprop="name"]"#,
    r#"[itemprop="author"]"#,
    ".author",
    r#"a[rel="author"]"#,
]);

/// Link to the commenter's profile
pub static COMMENT_PROFILE: Fallbacks = Fallbacks::new(&[
    "a.comments-post-meta__actor-link",
    "a.comments-comment-meta__description-container",
    "a.comments-comment-meta__image-link",
    r#"a[href*="/in/"]"#,
    r#"a[rel="author"]"#,
    ".comment-author a[href]",
    ".author a[href]",
]);

/// Profile headline under the commenter's name
pub static COMMENT_HEADLINE: Fallbacks = Fallbacks::new(&[
    ".comments-post-meta__headline",
    ".comments-comment-meta__description-subtitle",
    ".comment-author-headline",
    ".author-headline",
]);

/// Visible posting time
pub static COMMENT_TIMESTAMP: Fallbacks = Fallbacks::new(&[
    "time",
    ".comments-comment-item__timestamp",
    ".comments-comment-meta__data",
    r#"[data-test-id*="timestamp"]"#,
    ".timestamp",
    ".comment-date",
]);

/// Comment body
pub static COMMENT_BODY: Fallbacks = Fallbacks::new(&[
    ".comments-comment-item__main-content",
    ".comments-comment-item-content-body",
    ".comments-comment-item__inline-show-more-text",
    r#"[data-test-id*="comment-text"]"#,
    ".update-components-text",
    ".comment-body",
    ".comment-content",
    ".comment-text",
    r#"[itemprop="text"]"#,
    "p",
]);

// ============================================================
// POST FIELD FALLBACKS
// ============================================================

/// Containers that hold the post itself
pub static POST_ROOT: Fallbacks = Fallbacks::new(&[
    ".feed-shared-update-v2",
    r#"[data-urn^="urn:li:activity"]"#,
    "article",
    "main",
    "body",
]);

/// Post author display name
pub static POST_AUTHOR: Fallbacks = Fallbacks::new(&[
    ".update-components-actor__name",
    ".update-components-actor__title",
    ".feed-shared-actor__name",
    ".post-author .name",
    ".post-author",
    r#"[itemprop="author"] [itemprop="name"]"#,
    r#"[itemprop="author"]"#,
    ".author",
]);

/// Link to the post author's profile
pub static POST_PROFILE: Fallbacks = Fallbacks::new(&[
    "a.update-components-actor__meta-link",
    "a.update-components-actor__image",
    "a.feed-shared-actor__container-link",
    ".post-author a[href]",
    r#"a[rel="author"]"#,
    ".author a[href]",
]);

/// Post body
pub static POST_CONTENT: Fallbacks = Fallbacks::new(&[
    ".feed-shared-update-v2__description",
    ".feed-shared-inline-show-more-text",
    ".update-components-text",
    ".feed-shared-text",
    ".post-content",
    ".post-body",
    r#"[itemprop="articleBody"]"#,
]);

/// Visible post time
pub static POST_TIMESTAMP: Fallbacks = Fallbacks::new(&[
    "time",
    ".update-components-actor__sub-description",
    ".feed-shared-actor__sub-description",
    ".post-date",
]);

/// Reaction/like counters
pub static POST_ENGAGEMENT: Fallbacks = Fallbacks::new(&[
    ".social-details-social-counts__reactions-count",
    ".social-details-social-counts__social-proof-fallback-number",
    ".social-details-social-counts__social-proof-text",
    r#"[data-test-id="social-actions__reaction-count"]"#,
    ".reactions-count",
    ".likes-count",
]);

/// First number in a counter, with an optional K/M multiplier
#[allow(clippy::expect_used)]
static COUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kKmM])?\b").expect("valid regex")
});

// ============================================================
// SCOPED LOOKUP
// ============================================================

/// Where a field lookup may look.
///
/// Candidates are searched under `root` in document order; a candidate is
/// rejected if it, or any ancestor below `root`, is in `excluded`.
#[derive(Clone, Copy)]
pub struct Scope<'a, 'd> {
    root: &'a Selection<'d>,
    excluded: &'a HashSet<NodeId>,
}

impl<'a, 'd> Scope<'a, 'd> {
    /// Scope rooted at `root`, skipping the subtrees of `excluded` nodes.
    #[must_use]
    pub fn new(root: &'a Selection<'d>, excluded: &'a HashSet<NodeId>) -> Self {
        Self { root, excluded }
    }

    /// First in-scope element matched by the first selector that has one.
    #[must_use]
    pub fn first(&self, fields: &Fallbacks) -> Option<Selection<'d>> {
        fields.matchers().iter().find_map(|matcher| self.first_of(matcher))
    }

    fn first_of(&self, matcher: &Matcher) -> Option<Selection<'d>> {
        self.root
            .select_matcher(matcher)
            .nodes()
            .iter()
            .map(|node| Selection::from(*node))
            .find(|candidate| !self.is_excluded(candidate))
    }

    fn is_excluded(&self, candidate: &Selection) -> bool {
        let root_id = dom::node_id(self.root);
        let mut current = candidate.clone();

        while let Some(id) = dom::node_id(&current) {
            if Some(id) == root_id {
                return false;
            }
            if self.excluded.contains(&id) {
                return true;
            }
            current = current.parent();
        }
        false
    }

    fn first_text(&self, fields: &Fallbacks, read: fn(&Selection) -> String) -> String {
        fields
            .matchers()
            .iter()
            .filter_map(|matcher| self.first_of(matcher))
            .map(|sel| read(&sel))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }

    /// Whitespace-normalized text of the first non-empty match.
    #[must_use]
    pub fn text(&self, fields: &Fallbacks) -> String {
        self.first_text(fields, dom::normalized_text)
    }

    /// Like [`Scope::text`], but prefers the sighted-user rendering of a name.
    #[must_use]
    pub fn name_text(&self, fields: &Fallbacks) -> String {
        self.first_text(fields, displayed_name)
    }

    /// `href` of the first match that carries one, made absolute.
    #[must_use]
    pub fn link(&self, fields: &Fallbacks, base: Option<&Url>) -> String {
        fields
            .matchers()
            .iter()
            .filter_map(|matcher| self.first_of(matcher))
            .filter_map(|sel| dom::get_attribute(&sel, "href"))
            .map(|href| normalize_profile_url(&href, base))
            .find(|href| !href.is_empty())
            .unwrap_or_default()
    }

    /// Machine-readable `datetime` if present, else the visible time text.
    #[must_use]
    pub fn timestamp(&self, fields: &Fallbacks) -> String {
        if let Some(time) = self.first(&TIME_WITH_DATETIME) {
            if let Some(datetime) = dom::get_attribute(&time, "datetime") {
                let datetime = datetime.trim();
                if !datetime.is_empty() {
                    return datetime.to_string();
                }
            }
        }
        self.text(fields)
    }
}

/// Name as a reader sees it.
///
/// Names are often rendered twice, once for sighted users
/// (`aria-hidden="true"`) and once for screen readers; the former wins.
fn displayed_name(sel: &Selection) -> String {
    let shown = sel.select(r#"[aria-hidden="true"]"#);
    if shown.exists() {
        let text = dom::normalized_text(&shown.first());
        if !text.is_empty() {
            return text;
        }
    }
    dom::normalized_text(sel)
}

/// Resolve a profile link and drop tracking query strings and fragments.
#[must_use]
pub fn normalize_profile_url(href: &str, base: Option<&Url>) -> String {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with('#') {
        return String::new();
    }

    let resolved = Url::parse(href).or_else(|e| match base {
        Some(base) => base.join(href),
        None => Err(e),
    });

    match resolved {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Parse a reaction counter such as `"1,234 reactions"` or `"1.2K"`.
#[must_use]
pub fn parse_count(text: &str) -> u64 {
    let Some(caps) = COUNT_PATTERN.captures(text) else {
        return 0;
    };
    let digits = caps.get(1).map_or("", |m| m.as_str()).replace(',', "");
    let Ok(value) = digits.parse::<f64>() else {
        return 0;
    };
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("k" | "K") => 1_000.0,
        Some("m" | "M") => 1_000_000.0,
        _ => 1.0,
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = (value * multiplier).round() as u64;
    count
}

// ============================================================
// EXTRACTION
// ============================================================

/// Map one located element to a comment record.
///
/// Returns `None` when neither the identity region (author, profile, time)
/// nor the body can be found; such elements are usually structural
/// siblings of the comments (profile widgets, sort controls, spacers).
#[must_use]
pub fn extract_child(
    element: &Selection,
    excluded: &HashSet<NodeId>,
    base: Option<&Url>,
    strategy: DedupStrategy,
) -> Option<ChildRecord> {
    let scope = Scope::new(element, excluded);

    let author = scope.name_text(&COMMENT_AUTHOR);
    let author_profile = scope.link(&COMMENT_PROFILE, base);
    let timestamp = scope.timestamp(&COMMENT_TIMESTAMP);
    let text = scope.text(&COMMENT_BODY);

    let has_identity = !(author.is_empty() && author_profile.is_empty() && timestamp.is_empty());
    if !has_identity && text.is_empty() {
        debug!(
            tag = dom::tag_name(element).as_deref().unwrap_or(""),
            "skipping element without identity or body"
        );
        return None;
    }

    let author_headline = scope.text(&COMMENT_HEADLINE);
    let who = if author.is_empty() { &author_profile } else { &author };
    let dedup_key = dedup::derive_key(who, &text, strategy);

    Some(ChildRecord {
        author,
        author_profile,
        author_headline,
        text,
        timestamp,
        dedup_key,
    })
}

/// Extract the post the thread belongs to.
///
/// `comments` are the located comment nodes; nothing inside them is read.
#[must_use]
pub fn extract_parent(
    doc: &Document,
    comments: &HashSet<NodeId>,
    source_url: &str,
) -> ParentRecord {
    let base = Url::parse(source_url).ok();
    let root = POST_ROOT
        .matchers()
        .iter()
        .map(|matcher| doc.select_matcher(matcher))
        .find(Selection::exists)
        .unwrap_or_else(|| doc.select("html"));
    let root = root.first();
    let scope = Scope::new(&root, comments);

    ParentRecord {
        author: scope.name_text(&POST_AUTHOR),
        author_profile: scope.link(&POST_PROFILE, base.as_ref()),
        content: scope.text(&POST_CONTENT),
        timestamp: scope.timestamp(&POST_TIMESTAMP),
        source_url: source_url.to_string(),
        engagement_count: parse_count(&scope.text(&POST_ENGAGEMENT)),
    }
}
