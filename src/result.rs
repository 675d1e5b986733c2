//! Result types for harvest output.
//!
//! `ResultSet` is what gets serialized. `ExtractionReport` carries the
//! diagnostics of a run and is kept out of the payload so that two runs over
//! the same document serialize identically.

use serde::{Deserialize, Serialize};

/// The post that the discussion thread hangs off.
///
/// Fields that could not be located are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRecord {
    /// Display name of the post author.
    pub author: String,

    /// Absolute link to the author's profile.
    pub author_profile: String,

    /// Post body text.
    pub content: String,

    /// Posting time as shown (or as the `datetime` attribute carries it).
    pub timestamp: String,

    /// URL of the page the thread was harvested from.
    pub source_url: String,

    /// Reaction/like count; `0` when absent.
    pub engagement_count: u64,
}

/// One comment in the thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRecord {
    /// Display name of the commenter.
    pub author: String,

    /// Absolute link to the commenter's profile.
    pub author_profile: String,

    /// Profile headline shown under the commenter's name.
    pub author_headline: String,

    /// Comment text, whitespace-normalized.
    pub text: String,

    /// Posting time as shown.
    pub timestamp: String,

    /// Key used to drop repeated scans of the same comment.
    pub dedup_key: String,
}

/// The serialized output of a harvest: the post plus its comments in
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// The post.
    pub parent: ParentRecord,

    /// Comments in DOM traversal order, unique by `dedup_key`.
    pub children: Vec<ChildRecord>,
}

/// Final state of the page expander.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionState {
    /// Not started.
    #[default]
    Idle,
    /// Advancing the viewport and measuring height.
    Scrolling,
    /// Height stopped changing (or the scroll phase ran out).
    Stable,
    /// Activating "load more" controls.
    Expanding,
    /// Finished.
    Done,
}

/// What the page expander did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionReport {
    /// Whether the expander ran at all.
    pub enabled: bool,

    /// Iterations consumed (scroll steps plus expansion rounds).
    pub iterations: usize,

    /// Number of controls activated.
    pub controls_activated: usize,

    /// True when the iteration cap forced termination.
    pub hit_iteration_cap: bool,

    /// State the expander finished in.
    pub final_state: ExpansionState,
}

/// Diagnostics for one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Elements returned by the final scan.
    pub located: usize,

    /// Elements with neither identity nor body.
    pub skipped: usize,

    /// Records dropped as duplicates.
    pub duplicates: usize,

    /// Expander summary.
    pub expansion: ExpansionReport,

    /// Non-fatal problems (bad selectors, driver failures).
    pub warnings: Vec<String>,
}

/// Everything a harvest produces.
#[derive(Debug, Clone)]
pub struct Harvest {
    /// The structured result.
    pub result: ResultSet,

    /// Serialized payload handed to the byte sink.
    pub payload: Vec<u8>,

    /// Suggested file name, `<source>_<epoch-millis>.json`.
    pub suggested_name: String,

    /// Diagnostics.
    pub report: ExtractionReport,
}
