//! Error types for catalog operations.

use thiserror::Error;

/// Errors raised while fetching the shard list or a shard's book array.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Connection-level failure (DNS, refused connection, TLS, reset body).
    #[error("network error fetching {url}: {source}")]
    Transport {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded its timeout.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body could not be parsed as the expected document.
    #[error("unexpected catalog document at {url}: {reason}")]
    Format {
        /// The URL whose body was malformed.
        url: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl CatalogError {
    /// Maps a reqwest send/body error to `Timeout` or `Transport`.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Transport { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a format error.
    pub fn format(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns true when retrying the same request could plausibly succeed.
    ///
    /// Transport failures, timeouts, 429 and 5xx are transient; other
    /// statuses and malformed documents are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Format { .. } => false,
        }
    }
}
