//! Error types for rs-thread-harvest.
//!
//! Most failures inside a harvest are soft: an unparseable selector, a missing
//! field or a flaky page driver are logged and recorded as warnings. Only the
//! variants below ever leave the pipeline.

/// Error type for harvest operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The live page driver failed (scroll, click, snapshot).
    #[error("Page driver failed: {0}")]
    Page(String),

    /// The result set could not be serialized.
    #[error("Export failed: {0}")]
    Export(#[from] serde_json::Error),

    /// Options were rejected before any page interaction.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reading input or writing the payload failed.
    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for harvest operations.
pub type Result<T> = std::result::Result<T, Error>;
