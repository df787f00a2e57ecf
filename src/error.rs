//! Error types for the redaction engine.
//!
//! The taxonomy separates fatal, session-level failures (a source document
//! that cannot be opened, a composition that cannot complete) from per-page
//! recognition failures, which are absorbed by the analysis loop and surfaced
//! only as an absence of findings for that page.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for redaction operations.
pub type RedactResult<T> = Result<T, RedactError>;

/// Error type for all redaction operations.
#[derive(Debug, Error)]
pub enum RedactError {
    /// The source document is unreadable or corrupt. Fatal: the session
    /// cannot start.
    #[error("failed to open source document '{path}': {reason}")]
    DocumentOpen { path: PathBuf, reason: String },

    /// Text recognition failed on a single page. Non-fatal: the page
    /// proceeds with zero detected regions.
    #[error("text recognition failed on page {page}: {reason}")]
    PageRecognition { page: usize, reason: String },

    /// Text recognition exceeded the bounded wait for a single page.
    /// Treated identically to [`RedactError::PageRecognition`].
    #[error("text recognition timed out on page {page} after {timeout:?}")]
    RecognitionTimeout { page: usize, timeout: Duration },

    /// Composition of the flattened output failed. Fatal at apply-time;
    /// no partial output is valid.
    #[error("composition failed: {message}")]
    Composition {
        message: String,
        page: Option<usize>,
    },

    /// A region violated the store's invariants (duplicate id, rect outside
    /// the unit square, page index past the end of the document).
    #[error("invalid region: {reason}")]
    InvalidRegion { reason: String },

    /// Pattern compilation failed.
    #[error("pattern error for '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// File read/write failure outside of document open/composition.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RedactError {
    /// True for failures that are confined to a single page and must never
    /// abort a whole-document analysis.
    pub fn is_page_local(&self) -> bool {
        matches!(
            self,
            Self::PageRecognition { .. } | Self::RecognitionTimeout { .. }
        )
    }
}

impl From<regex::Error> for RedactError {
    fn from(err: regex::Error) -> Self {
        Self::Pattern {
            pattern: "<unknown>".to_string(),
            reason: err.to_string(),
        }
    }
}
