//! Configuration options for a harvest run.
//!
//! The `Options` struct controls page expansion, element location and export.
//! All fields are public; use `Default::default()` for the standard settings
//! and struct update syntax to override individual fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default comment selector candidates, most specific first.
pub const DEFAULT_SELECTOR_CANDIDATES: &[&str] = &[
    ".comments-comment-item",
    r#"[data-test-id^="comments-comment-"]"#,
    ".scaffold-finite-scroll__content > div",
    ".comments-comments-list > div",
];

/// Default labels of controls that reveal more comments.
pub const DEFAULT_EXPANSION_LABELS: &[&str] = &["load more comments", "show more comments"];

/// How the deduplication key of a child record is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Author plus the first `len` characters of the normalized body.
    ///
    /// Two distinct comments by the same author sharing a longer prefix
    /// collapse into one.
    Prefix {
        /// Prefix length in characters.
        len: usize,
    },

    /// Author plus a blake3 digest of the full normalized body.
    ContentHash,
}

impl Default for DedupStrategy {
    fn default() -> Self {
        Self::Prefix { len: 30 }
    }
}

/// Configuration options for a harvest run.
///
/// Unknown fields in a config file are rejected; missing fields fall back
/// to their defaults.
///
/// # Example
///
/// ```rust
/// use rs_thread_harvest::Options;
///
/// let options = Options {
///     auto_expand: false,
///     source_label: "post".to_string(),
///     ..Options::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Drive the page expander before scanning.
    ///
    /// When false, extraction runs against the document's current state only.
    ///
    /// Default: `true`
    pub auto_expand: bool,

    /// Ordered selector candidates for comment elements.
    ///
    /// Default: [`DEFAULT_SELECTOR_CANDIDATES`]
    pub selector_candidates: Vec<String>,

    /// Visible labels of "load more" controls, matched case-insensitively
    /// as substrings.
    ///
    /// Default: [`DEFAULT_EXPANSION_LABELS`]
    pub expansion_labels: Vec<String>,

    /// Selector for the kind of interactive control scanned for labels.
    ///
    /// Default: `"button"`
    pub control_selector: String,

    /// Hard cap on expander iterations (scroll steps plus expansion rounds).
    ///
    /// Default: `20`
    pub max_scroll_iterations: usize,

    /// Consecutive unchanged height checks that count as stable.
    ///
    /// Default: `3`
    pub stable_checks: usize,

    /// Viewport advance per scroll step, in pixels.
    ///
    /// Default: `800`
    pub scroll_step_px: u32,

    /// Pause after each scroll or activation so the page can render.
    ///
    /// Default: `300`
    pub settle_delay_ms: u64,

    /// Deduplication key derivation.
    ///
    /// Default: `Prefix { len: 30 }`
    pub dedup_strategy: DedupStrategy,

    /// Prefix of the suggested output filename.
    ///
    /// Default: `"thread"`
    pub source_label: String,

    /// Pretty-print the JSON payload.
    ///
    /// Default: `true`
    pub pretty: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            auto_expand: true,
            selector_candidates: DEFAULT_SELECTOR_CANDIDATES
                .iter()
                .map(ToString::to_string)
                .collect(),
            expansion_labels: DEFAULT_EXPANSION_LABELS
                .iter()
                .map(ToString::to_string)
                .collect(),
            control_selector: "button".to_string(),
            max_scroll_iterations: 20,
            stable_checks: 3,
            scroll_step_px: 800,
            settle_delay_ms: 300,
            dedup_strategy: DedupStrategy::default(),
            source_label: "thread".to_string(),
            pretty: true,
        }
    }
}

impl Options {
    /// Parse options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the JSON is malformed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config`
    /// if its content is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that the options describe a run that can terminate and
    /// produce keys.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_scroll_iterations == 0 {
            return Err(Error::Config(
                "max_scroll_iterations must be at least 1".to_string(),
            ));
        }
        if self.stable_checks == 0 {
            return Err(Error::Config("stable_checks must be at least 1".to_string()));
        }
        if self.control_selector.trim().is_empty() {
            return Err(Error::Config("control_selector must not be empty".to_string()));
        }
        if self.dedup_strategy == (DedupStrategy::Prefix { len: 0 }) {
            return Err(Error::Config("dedup prefix length must be at least 1".to_string()));
        }
        Ok(())
    }
}
