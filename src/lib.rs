//! # rs-thread-harvest
//!
//! Structured comment extraction for long discussion threads that load
//! their content lazily.
//!
//! A harvest expands the live page (scrolling and clicking "load more"
//! controls), locates comment elements through a list of fallback selectors,
//! turns each into a typed record, drops repeats and serializes the result
//! to JSON.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_thread_harvest::{harvest_html, Options};
//!
//! let html = r#"<html><body>
//!   <div class="comments-comment-item">
//!     <span class="comments-post-meta__name-text">Ada</span>
//!     <div class="comments-comment-item__main-content">First!</div>
//!   </div>
//! </body></html>"#;
//!
//! let harvest = harvest_html(html, "https://example.com/post/1", &Options::default())?;
//! assert_eq!(harvest.result.children[0].author, "Ada");
//! assert!(harvest.suggested_name.starts_with("thread_"));
//! # Ok::<(), rs_thread_harvest::Error>(())
//! ```
//!
//! Against a live page, implement [`Page`] for the browser driver and call
//! [`harvest`].

mod error;
mod options;
mod result;

/// DOM operations adapter over `dom_query`.
pub mod dom;

/// Live page abstraction.
pub mod page;

/// Element location by selector candidates and control labels.
pub mod locator;

/// Page expansion state machine.
pub mod expander;

/// Element to record mapping.
pub mod record;

/// Record deduplication.
pub mod dedup;

/// JSON serialization and output naming.
pub mod export;

/// Pipeline orchestration.
pub mod pipeline;

/// Character encoding detection and transcoding.
pub mod encoding;

// Public API - re-exports
pub use error::{Error, Result};
pub use options::{DedupStrategy, Options, DEFAULT_EXPANSION_LABELS, DEFAULT_SELECTOR_CANDIDATES};
pub use page::{ControlHandle, Page, StaticPage};
pub use pipeline::{harvest, harvest_html};
pub use result::{
    ChildRecord, ExpansionReport, ExpansionState, ExtractionReport, Harvest, ParentRecord,
    ResultSet,
};
