//! Live page abstraction.
//!
//! The `Page` trait is the only door to the host environment. Everything
//! else in the crate works on an HTML snapshot taken through it, so
//! `dom_query` documents never live across an await point.

use std::time::Duration;

use async_trait::async_trait;

use crate::encoding;
use crate::error::Result;

/// A control found by label, addressed the way the driver can find it again.
///
/// `index` is the position of the control among all elements matching
/// `selector` in the snapshot it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlHandle {
    /// Selector for the kind of control (e.g. `button`).
    pub selector: String,

    /// Document-order index among matches of `selector`.
    pub index: usize,

    /// The configured label that matched.
    pub label: String,

    /// The control's visible text, whitespace-normalized.
    pub text: String,
}

/// A live, queryable document.
#[async_trait]
pub trait Page: Send + Sync {
    /// Current serialized DOM.
    async fn html(&self) -> Result<String>;

    /// URL of the page.
    async fn url(&self) -> Result<String>;

    /// Full document height in pixels.
    async fn scroll_height(&self) -> Result<u64>;

    /// Advance the viewport.
    async fn scroll_by(&mut self, dy: u32) -> Result<()>;

    /// Click a control previously found in a snapshot.
    async fn activate(&mut self, control: &ControlHandle) -> Result<()>;

    /// Give the host page time to render asynchronously loaded content.
    async fn settle(&mut self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// A page frozen at one snapshot, e.g. HTML saved to disk.
///
/// Scrolling and activation are no-ops and the height never changes, so the
/// expander settles immediately.
#[derive(Debug, Clone)]
pub struct StaticPage {
    html: String,
    url: String,
}

impl StaticPage {
    /// Wrap an HTML string.
    #[must_use]
    pub fn new(html: impl Into<String>, url: impl Into<String>) -> Self {
        Self { html: html.into(), url: url.into() }
    }

    /// Wrap raw HTML bytes, transcoding from the declared charset.
    #[must_use]
    pub fn from_bytes(html: &[u8], url: impl Into<String>) -> Self {
        Self::new(encoding::transcode_to_utf8(html), url)
    }
}

#[async_trait]
impl Page for StaticPage {
    async fn html(&self) -> Result<String> {
        Ok(self.html.clone())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn scroll_height(&self) -> Result<u64> {
        Ok(self.html.len() as u64)
    }

    async fn scroll_by(&mut self, _dy: u32) -> Result<()> {
        Ok(())
    }

    async fn activate(&mut self, _control: &ControlHandle) -> Result<()> {
        Ok(())
    }

    async fn settle(&mut self, _delay: Duration) {}
}
