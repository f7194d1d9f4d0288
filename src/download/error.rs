//! Error types for artifact retrieval.
//!
//! A failing candidate is not an error on its own: it becomes a
//! [`CandidateRejection`] and the fetcher moves on. Only exhausting every
//! candidate, or failing to persist an accepted body, yields a [`DownloadError`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why one candidate endpoint was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionKind {
    /// Connection-level failure, including a body cut off mid-stream.
    Transport(String),
    /// The request exceeded its timeout.
    Timeout,
    /// Non-2xx response.
    HttpStatus(u16),
    /// 2xx response whose `Content-Type` does not name the expected format.
    ContentType(String),
    /// 2xx response smaller than the minimum plausible size.
    TooSmall {
        /// Bytes received (or announced by `Content-Length`).
        bytes: u64,
        /// Configured minimum.
        min_bytes: u64,
    },
    /// The candidate URL does not parse.
    InvalidUrl,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "network error: {message}"),
            Self::Timeout => write!(f, "timed out"),
            Self::HttpStatus(status) => write!(f, "HTTP {status}"),
            Self::ContentType(content_type) if content_type.is_empty() => {
                write!(f, "missing content-type")
            }
            Self::ContentType(content_type) => write!(f, "unexpected content-type '{content_type}'"),
            Self::TooSmall { bytes, min_bytes } => {
                write!(f, "only {bytes} bytes (minimum {min_bytes})")
            }
            Self::InvalidUrl => write!(f, "invalid URL"),
        }
    }
}

/// One failed candidate attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRejection {
    /// 1-based candidate rank.
    pub rank: usize,
    /// Candidate URL.
    pub url: String,
    /// What went wrong.
    pub kind: RejectionKind,
}

impl fmt::Display for CandidateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rank {} ({}): {}", self.rank, self.url, self.kind)
    }
}

/// Errors that end a book's retrieval.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The candidate set was empty.
    #[error("no candidate endpoints for {name}")]
    NoCandidates {
        /// Display name of the book.
        name: String,
    },

    /// Every candidate was tried and rejected.
    #[error("all {} endpoint(s) failed for {name}: {}", attempts.len(), summarize(attempts))]
    AllEndpointsFailed {
        /// Display name of the book.
        name: String,
        /// Rejections in rank order.
        attempts: Vec<CandidateRejection>,
    },

    /// Local file system failure while persisting an accepted body.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

fn summarize(attempts: &[CandidateRejection]) -> String {
    attempts
        .iter()
        .map(|attempt| format!("rank {}: {}", attempt.rank, attempt.kind))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DownloadError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
