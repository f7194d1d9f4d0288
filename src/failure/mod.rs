//! Failure classification and user-facing descriptors for per-book failures.

use textbook_core::{BookFailure, FailureReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureCategory {
    Catalog,
    Source,
    Network,
    Content,
    Disk,
}

impl FailureCategory {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Catalog => "🔎",
            Self::Source => "❌",
            Self::Network => "🌐",
            Self::Content => "📄",
            Self::Disk => "💾",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Catalog => "Catalog lookup",
            Self::Source => "Book source",
            Self::Network => "Network",
            Self::Content => "Content validation",
            Self::Disk => "Local storage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDescriptor {
    pub category: FailureCategory,
    pub what: &'static str,
    pub why: &'static str,
    pub fix: &'static str,
}

const SEQUENCE_NOT_FOUND: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Catalog,
    what: "Sequence number not in catalog",
    why: "The number is past the last book of every reachable shard.",
    fix: "Run `textbook-downloader export` to list valid numbers, or retry if shards were skipped.",
};

const MALFORMED_ENTRY: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Catalog,
    what: "Unreadable catalog entry",
    why: "The catalog lists this position but its entry has no usable book id.",
    fix: "Nothing to retry for this position; the rest of the catalog is unaffected.",
};

const DETAIL_UNAVAILABLE: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Network,
    what: "Book details unavailable",
    why: "The detail document for this book could not be fetched.",
    fix: "Check connectivity, then rerun the same command.",
};

const NO_SOURCE: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Source,
    what: "No downloadable document",
    why: "The book lists previews only and no source document.",
    fix: "Try another edition of the book; this one cannot be downloaded.",
};

const ENDPOINTS_UNREACHABLE: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Network,
    what: "Every mirror failed",
    why: "Each candidate endpoint timed out, refused the connection or returned an error status.",
    fix: "Check connectivity or VPN settings, then rerun to retry the failed books.",
};

const ENDPOINTS_INVALID_CONTENT: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Content,
    what: "Mirrors returned no real document",
    why: "Responses were error pages or too small to be a complete PDF.",
    fix: "Retry later; lower `--min-bytes` only if the book is known to be small.",
};

const WRITE_FAILED: FailureDescriptor = FailureDescriptor {
    category: FailureCategory::Disk,
    what: "Could not save the file",
    why: "The download succeeded but writing it to the output directory failed.",
    fix: "Check free disk space and permissions of the output directory.",
};

/// Returns the descriptor for one failed book.
#[must_use]
pub fn describe_failure(failure: &BookFailure) -> FailureDescriptor {
    let detail = failure.detail.as_str();
    match failure.reason {
        FailureReason::NotFound => {
            if detail.contains("no source item") || detail.contains("no storage URLs") {
                NO_SOURCE
            } else if detail.contains("malformed catalog entry")
                || detail.contains("catalog entry has an empty id")
            {
                MALFORMED_ENTRY
            } else if detail.contains("fetching details")
                || detail.contains("unexpected detail document")
            {
                DETAIL_UNAVAILABLE
            } else {
                SEQUENCE_NOT_FOUND
            }
        }
        FailureReason::NoCandidates => NO_SOURCE,
        FailureReason::AllEndpointsFailed => {
            if detail.contains("content-type") || detail.contains("bytes (minimum") {
                ENDPOINTS_INVALID_CONTENT
            } else {
                ENDPOINTS_UNREACHABLE
            }
        }
        FailureReason::IoError => WRITE_FAILED,
    }
}
