//! Error types for book metadata resolution.
//!
//! Every variant resolves to outcome reason `NotFound` for control flow; the
//! variants only differ in the diagnostic line shown to the operator.

use thiserror::Error;

/// Errors raised while turning a book identifier into artifact candidates.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The detail document has no item flagged as the source file.
    #[error("book '{book_id}' has no source item\n  Suggestion: the book may only offer previews; try another edition")]
    NoSourceItem {
        /// The book that was looked up.
        book_id: String,
    },

    /// The source item exists but lists no storage URLs.
    #[error("book '{book_id}' source item lists no storage URLs")]
    NoStorageUrls {
        /// The book that was looked up.
        book_id: String,
    },

    /// Connection-level failure fetching the detail document.
    #[error("network error fetching details for '{book_id}': {source}")]
    Transport {
        /// The book that was looked up.
        book_id: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The detail request exceeded its timeout.
    #[error("timeout fetching details for '{book_id}'")]
    Timeout {
        /// The book that was looked up.
        book_id: String,
    },

    /// The detail endpoint answered with a non-2xx status.
    #[error("HTTP {status} fetching details for '{book_id}'\n  Suggestion: check that the book ID is correct")]
    HttpStatus {
        /// The book that was looked up.
        book_id: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The detail document could not be parsed.
    #[error("unexpected detail document for '{book_id}': {reason}")]
    Format {
        /// The book that was looked up.
        book_id: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ResolveError {
    /// Maps a reqwest send/body error to `Timeout` or `Transport`.
    pub fn from_reqwest(book_id: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                book_id: book_id.to_string(),
            }
        } else {
            Self::Transport {
                book_id: book_id.to_string(),
                source,
            }
        }
    }

    /// Creates a `NoSourceItem` error.
    #[must_use]
    pub fn no_source_item(book_id: &str) -> Self {
        Self::NoSourceItem {
            book_id: book_id.to_string(),
        }
    }

    /// Creates a `NoStorageUrls` error.
    #[must_use]
    pub fn no_storage_urls(book_id: &str) -> Self {
        Self::NoStorageUrls {
            book_id: book_id.to_string(),
        }
    }

    /// Creates an `HttpStatus` error.
    #[must_use]
    pub fn http_status(book_id: &str, status: u16) -> Self {
        Self::HttpStatus {
            book_id: book_id.to_string(),
            status,
        }
    }

    /// Creates a `Format` error.
    #[must_use]
    pub fn format(book_id: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            book_id: book_id.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the remote side simply has nothing to download for this book.
    #[must_use]
    pub fn is_missing_artifact(&self) -> bool {
        matches!(self, Self::NoSourceItem { .. } | Self::NoStorageUrls { .. })
    }
}
