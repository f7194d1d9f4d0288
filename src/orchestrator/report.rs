//! Per-book outcomes and the batch report.

use std::fmt;
use std::path::PathBuf;

use super::locator::{BookRef, Locator};
use crate::catalog::SequenceError;
use crate::download::{DownloadError, StoredArtifact};
use crate::resolver::ResolveError;

/// Why a book was not retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The locator named no book, or the book has nothing downloadable.
    NotFound,
    /// The book's candidate set was empty.
    NoCandidates,
    /// Every candidate endpoint was rejected.
    AllEndpointsFailed,
    /// The accepted artifact could not be written locally.
    IoError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::NoCandidates => "no candidate endpoints",
            Self::AllEndpointsFailed => "all endpoints failed",
            Self::IoError => "write failed",
        };
        f.write_str(label)
    }
}

impl From<&SequenceError> for FailureReason {
    fn from(_: &SequenceError) -> Self {
        Self::NotFound
    }
}

impl From<&ResolveError> for FailureReason {
    fn from(_: &ResolveError) -> Self {
        Self::NotFound
    }
}

impl From<&DownloadError> for FailureReason {
    fn from(error: &DownloadError) -> Self {
        match error {
            DownloadError::NoCandidates { .. } => Self::NoCandidates,
            DownloadError::AllEndpointsFailed { .. } => Self::AllEndpointsFailed,
            DownloadError::Io { .. } => Self::IoError,
        }
    }
}

/// The single outcome recorded for every book a run considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// The artifact was stored.
    Success {
        /// Bytes written.
        bytes_written: u64,
        /// Rank of the candidate that was accepted.
        endpoint_rank_used: usize,
    },
    /// The artifact was not stored.
    Failure {
        /// Classified reason.
        reason: FailureReason,
        /// Human-readable diagnostic.
        detail: String,
    },
}

/// One stored book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSuccess {
    /// Which book.
    pub book: BookRef,
    /// Display name used for the file.
    pub name: String,
    /// Final file path.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
    /// Rank of the candidate that was accepted.
    pub rank: usize,
}

/// One book that was not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFailure {
    /// Which book.
    pub book: BookRef,
    /// Display name, when the book was resolved far enough to have one.
    pub name: Option<String>,
    /// Classified reason.
    pub reason: FailureReason,
    /// Human-readable diagnostic.
    pub detail: String,
}

impl BookSuccess {
    #[must_use]
    pub fn outcome(&self) -> RetrievalOutcome {
        RetrievalOutcome::Success {
            bytes_written: self.bytes,
            endpoint_rank_used: self.rank,
        }
    }
}

impl BookFailure {
    #[must_use]
    pub fn outcome(&self) -> RetrievalOutcome {
        RetrievalOutcome::Failure {
            reason: self.reason,
            detail: self.detail.clone(),
        }
    }

    /// Display name or `"unknown"`.
    #[must_use]
    pub fn name_or_unknown(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }
}

/// Accumulated result of one orchestration call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Stored books in attempt order.
    pub successes: Vec<BookSuccess>,
    /// Failed books in attempt order.
    pub failures: Vec<BookFailure>,
    /// Shards that could not be fetched during the run.
    pub skipped_shards: Vec<usize>,
    /// The run stopped early because of an interrupt request.
    pub interrupted: bool,
    /// The shard list came from the configured fallback rather than the live catalog.
    pub degraded: bool,
    /// Where to continue when the run stopped before covering its locator.
    pub resume: Option<Locator>,
}

impl BatchReport {
    /// Books for which an outcome was recorded.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.successes.len()
    }

    /// True when nothing failed and the run was not cut short.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }

    /// Records a stored book.
    pub fn record_success(&mut self, book: BookRef, name: String, stored: &StoredArtifact) {
        self.successes.push(BookSuccess {
            book,
            name,
            path: stored.path.clone(),
            bytes: stored.bytes,
            rank: stored.rank,
        });
    }

    /// Records a book that was not stored.
    pub fn record_failure(
        &mut self,
        book: BookRef,
        name: Option<String>,
        reason: FailureReason,
        detail: impl Into<String>,
    ) {
        self.failures.push(BookFailure {
            book,
            name,
            reason,
            detail: detail.into(),
        });
    }
}
